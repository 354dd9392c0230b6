//! Association-chain collection and join rendering.
//!
//! A nested node reaches its data through the association chain from itself
//! up to (but not including) the root: its own (expanded) association with
//! the immediate parent, prepended by the intermediate links of every
//! non-root ancestor that traverses a `using` chain. The chain is ordered
//! root-side first.
//!
//! Association links are stored owner-side first regardless of traversal
//! direction, so rendering anchors each link on whichever of its sides is
//! already in scope: the node's own FROM alias, a previously joined table,
//! or an enclosing subquery alias. The far side is joined in; a link whose
//! far side is an enclosing alias becomes a WHERE correlation instead,
//! which is what ties each parent row to its own nested rows.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::query_graph::GraphNode;
use crate::schema_catalog::Association;

use super::errors::SqliteQueryGeneratorError;
use super::{Cx, GROUP_ID_PREFIX};

/// The enclosing scope a nested subquery correlates against.
pub(crate) struct ParentScope<'a> {
    /// Immediate parent node's schema hash (its subquery alias).
    pub alias: &'a str,
    /// Keys the parent grouped into `id_<key>` arrays; correlations against
    /// these switch from equality to `json_each` membership.
    pub grouped_keys: &'a BTreeSet<String>,
}

impl<'a> ParentScope<'a> {
    pub fn new(alias: &'a str, grouped_keys: &'a BTreeSet<String>) -> Self {
        ParentScope { alias, grouped_keys }
    }
}

/// One side of an association link.
struct Side<'a> {
    hash: &'a str,
    table: &'a str,
    /// Join key on this side; for links through a foreign table this is the
    /// key shared with the foreign table instead.
    key: &'a str,
}

fn source_side<'a>(a: &'a Association) -> Side<'a> {
    Side {
        hash: &a.source_hash,
        table: &a.source_table,
        key: match a.foreign_join() {
            Some((_, foreign_key)) => foreign_key,
            None => a.source_join_key(),
        },
    }
}

fn target_side<'a>(a: &'a Association) -> Side<'a> {
    Side {
        hash: &a.target_hash,
        table: &a.target_table,
        key: a.target_join_key(),
    }
}

/// `<left> = <outer>.<key>`, degrading to grouped-id membership when the
/// immediate parent grouped that key away.
fn comparison(left: &str, outer_hash: &str, outer_key: &str, scope: &ParentScope) -> String {
    if outer_hash == scope.alias && scope.grouped_keys.contains(outer_key) {
        format!(
            "{} IN (SELECT value FROM json_each({}.{}{}))",
            left, outer_hash, GROUP_ID_PREFIX, outer_key
        )
    } else {
        format!("{} = {}.{}", left, outer_hash, outer_key)
    }
}

/// Joins and correlation predicates for an association chain.
///
/// `anchor` opens the scope (the FROM alias); `outer` lists the enclosing
/// subquery aliases reachable for correlation. Returns the join clause text
/// and the WHERE predicates.
pub(crate) fn render_chain(
    chain: &[Arc<Association>],
    anchor: &str,
    outer: &[String],
    scope: &ParentScope,
) -> (String, Vec<String>) {
    let mut in_scope: HashSet<String> = HashSet::from([anchor.to_string()]);
    let is_outer = |hash: &str| outer.iter().any(|o| o == hash);

    let mut joins = String::new();
    let mut predicates = Vec::new();
    let mut remaining: Vec<&Arc<Association>> = chain.iter().collect();

    while !remaining.is_empty() {
        let position = remaining.iter().position(|a| {
            in_scope.contains(&a.source_hash)
                || in_scope.contains(&a.target_hash)
                || is_outer(&a.source_hash)
                || is_outer(&a.target_hash)
        });
        let Some(position) = position else {
            // A disconnected link cannot be anchored; association chains
            // from the registry are always connected.
            log::warn!("Skipping {} disconnected association link(s)", remaining.len());
            break;
        };
        let association = remaining.remove(position);
        let source = source_side(association);
        let target = target_side(association);
        // Prefer an in-scope anchor over an enclosing one, so correlations
        // keep the enclosing alias on their right-hand side (where the
        // grouped-id rewrite looks for it).
        let (near, far) = if in_scope.contains(source.hash) {
            (source, target)
        } else if in_scope.contains(target.hash) {
            (target, source)
        } else if is_outer(source.hash) {
            (source, target)
        } else {
            (target, source)
        };
        let join = association.join_keyword();

        match association.foreign_join() {
            Some((foreign_table, _)) => {
                // The foreign table bridges the two sides; it joins onto the
                // near side first, keyed per side.
                joins.push_str(&format!(
                    " {} {} ON {}",
                    join,
                    foreign_table,
                    comparison(
                        &format!("{}.{}", foreign_table, near.key),
                        near.hash,
                        near.key,
                        scope,
                    ),
                ));
                if in_scope.contains(far.hash) {
                    predicates.push(format!(
                        "{}.{} = {}.{}",
                        far.hash, far.key, foreign_table, far.key
                    ));
                } else if is_outer(far.hash) {
                    predicates.push(comparison(
                        &format!("{}.{}", foreign_table, far.key),
                        far.hash,
                        far.key,
                        scope,
                    ));
                } else {
                    joins.push_str(&format!(
                        " {} {} {} ON {}.{} = {}.{}",
                        join, far.table, far.hash, far.hash, far.key, foreign_table, far.key
                    ));
                    in_scope.insert(far.hash.to_string());
                }
            }
            None => {
                if in_scope.contains(far.hash) || is_outer(far.hash) {
                    predicates.push(comparison(
                        &format!("{}.{}", near.hash, near.key),
                        far.hash,
                        far.key,
                        scope,
                    ));
                } else {
                    joins.push_str(&format!(
                        " {} {} {} ON {}",
                        join,
                        far.table,
                        far.hash,
                        comparison(
                            &format!("{}.{}", far.hash, far.key),
                            near.hash,
                            near.key,
                            scope,
                        ),
                    ));
                    in_scope.insert(far.hash.to_string());
                }
            }
        }
    }
    (joins, predicates)
}

/// Collect the association chain from `node` up to (not including) the
/// root, ordered root-side first.
pub(crate) fn collect_chain(
    cx: &Cx,
    node: &GraphNode,
) -> Result<Vec<Arc<Association>>, SqliteQueryGeneratorError> {
    let mut chain: Vec<Arc<Association>> = Vec::new();
    let mut current = node;
    let mut is_node_itself = true;
    while let Some(parent_id) = current.parent {
        let parent = cx.graph.node(parent_id);
        let resolved = cx
            .registry
            .resolve_association(&parent.schema.name, &current.schema.name)?;
        if is_node_itself {
            chain.splice(0..0, resolved.chain);
        } else if !resolved.edge.using.is_empty() {
            // Ancestors only contribute their intermediate links; their own
            // endpoints are already in scope as enclosing subquery aliases.
            let middles = resolved.chain[..resolved.chain.len() - 1].to_vec();
            chain.splice(0..0, middles);
        }
        is_node_itself = false;
        current = parent;
    }
    Ok(chain)
}

/// Enclosing subquery aliases visible from inside `node`'s subquery,
/// immediate parent first.
pub(crate) fn outer_aliases(cx: &Cx, node: &GraphNode) -> Vec<String> {
    let mut aliases = Vec::new();
    let mut walker = node.parent;
    while let Some(parent_id) = walker {
        let parent = cx.graph.node(parent_id);
        aliases.push(parent.schema.hash.clone());
        walker = parent.parent;
    }
    aliases
}

/// FROM clause + joins of a nested node, and the WHERE correlation tying it
/// to the enclosing parent row.
pub(crate) fn render_node_source(
    cx: &Cx,
    node: &GraphNode,
    chain: &[Arc<Association>],
    scope: &ParentScope,
) -> (String, Vec<String>) {
    let outer = outer_aliases(cx, node);
    let (joins, predicates) = render_chain(chain, &node.schema.hash, &outer, scope);
    (
        format!("FROM {} {}{}", node.schema.table_name, node.schema.hash, joins),
        predicates,
    )
}

/// Grouped-id columns for a grouped node reached through an intermediate
/// chain: one `json_group_array(<target>.<key>) AS id_<key>` per non-belongs
/// link, deduplicated by (table, key). Returns the grouped key names next to
/// their SQL fragments.
pub(crate) fn group_id_fields(chain: &[Arc<Association>]) -> Vec<(String, String)> {
    let mut seen = HashSet::new();
    let mut fields = Vec::new();
    for association in chain {
        // Reversed-ownership links would re-expose the parent's own keys as
        // if they were grouped children.
        if association.kind.is_belongs() {
            continue;
        }
        let identity = (association.target_table.clone(), association.target_key.clone());
        if !seen.insert(identity) {
            continue;
        }
        fields.push((
            association.target_key.clone(),
            format!(
                "json_group_array({}.{}) AS {}{}",
                association.target_hash,
                association.target_key,
                GROUP_ID_PREFIX,
                association.target_key
            ),
        ));
    }
    fields
}
