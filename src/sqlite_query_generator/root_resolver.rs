//! Rendering of the graph root: the outer statement shell, cross-schema
//! filter joins and the separate count statement.

use std::collections::BTreeSet;

use super::errors::SqliteQueryGeneratorError;
use super::joins::{self, ParentScope};
use super::{fields, node_resolver, options, Cx, COUNT_FIELD, RESPONSE_FIELD};

/// Compile the whole graph into the main nested statement. The result is a
/// single row whose `response` column carries
/// `{"<rootDisplay>": [<record>, ...]}`.
pub(crate) fn render_query(cx: &Cx) -> Result<String, SqliteQueryGeneratorError> {
    let root = cx.graph.root();
    let alias = &root.schema.hash;
    let object_fields = fields::object_fields(root, &cx.args.locale_suffix)?;
    let raw_fields = fields::raw_fields(root, &cx.args.locale_suffix)?;
    let (association_joins, where_clause) = root_source(cx)?;
    let clauses = format!(
        "{}{}{}{}",
        where_clause,
        options::group_by_clause(cx, root)?,
        options::order_by_clause(cx, root)?,
        options::limit_clause(
            cx.args.size.or(root.options.size),
            cx.args.page.or(root.options.page),
        ),
    );
    let children = node_resolver::render_children(cx, root, &BTreeSet::new())?;

    let row_object = match children {
        Some(children) => format!("json_patch(json_object({}), {})", object_fields, children),
        None => format!("json_object({})", object_fields),
    };
    Ok(format!(
        "SELECT json_object('{display}', (SELECT json_group_array({row_object}) \
         FROM (SELECT {raw_fields} FROM {table} {alias}{association_joins}{clauses}) {alias})) \
         AS {response}",
        display = root.display_name(),
        row_object = row_object,
        raw_fields = raw_fields,
        table = root.schema.table_name,
        alias = alias,
        association_joins = association_joins,
        clauses = clauses,
        response = RESPONSE_FIELD,
    ))
}

/// Compile the companion count statement: same source and filters as the
/// main query, no paging, counting distinct root keys.
pub(crate) fn render_count_query(cx: &Cx) -> Result<String, SqliteQueryGeneratorError> {
    let root = cx.graph.root();
    let (association_joins, where_clause) = root_source(cx)?;
    Ok(format!(
        "SELECT COUNT(DISTINCT {alias}.{key}) AS {count} FROM {table} {alias}{association_joins}{where_clause}",
        alias = root.schema.hash,
        key = root.schema.primary_key,
        count = COUNT_FIELD,
        table = root.schema.table_name,
        association_joins = association_joins,
        where_clause = where_clause,
    ))
}

/// Joins and WHERE clause of the root source: filters first, then any
/// predicates contributed by cross-schema filter joins.
fn root_source(cx: &Cx) -> Result<(String, String), SqliteQueryGeneratorError> {
    let root = cx.graph.root();
    let (association_joins, mut predicates) = cross_schema_joins(cx)?;
    if let Some(filter_predicate) = options::filter_predicate(cx, root)? {
        predicates.insert(0, filter_predicate);
    }
    let where_clause = if predicates.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", predicates.join(" AND "))
    };
    Ok((association_joins, where_clause))
}

/// Joins for filters that reference a schema other than the root's own.
/// Such a schema does not need to appear in the result shape — it is joined
/// into the root source purely so the filter column resolves.
fn cross_schema_joins(cx: &Cx) -> Result<(String, Vec<String>), SqliteQueryGeneratorError> {
    let root = cx.graph.root();
    let empty = BTreeSet::new();
    let scope = ParentScope::new(&root.schema.hash, &empty);
    let mut joins = String::new();
    let mut predicates = Vec::new();
    for schema_name in options::referenced_schemas(cx, root) {
        let resolved = cx
            .registry
            .resolve_association(&root.schema.name, &schema_name)?;
        let (chain_joins, chain_predicates) =
            joins::render_chain(&resolved.chain, &root.schema.hash, &[], &scope);
        joins.push_str(&chain_joins);
        predicates.extend(chain_predicates);
    }
    Ok((joins, predicates))
}
