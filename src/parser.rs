//! Lowering of the `sqlparser` AST into the renderer's statement tree.
//!
//! Only the shapes the renderer knows how to lay out are accepted. Anything
//! else is reported as [`FormatError::Unparseable`] so the caller leaves the
//! text alone instead of printing a lossy rendition.

use sqlparser::ast;
use sqlparser::dialect::Dialect as SqlDialect;
use sqlparser::keywords::Keyword;
use sqlparser::parser::{Parser, ParserError};
use sqlparser::tokenizer::Token;

use crate::error::FormatError;
use crate::tree::{
    Delete, Expr, Insert, InsertSource, JoinConstraint, JoinKind, Limit, OrderItem, Select,
    SelectItem, Statement, TableExpr, Union, Update,
};

type Result<T> = std::result::Result<T, FormatError>;

fn unsupported(what: impl std::fmt::Display) -> FormatError {
    FormatError::Unparseable(format!("unsupported construct: {}", what))
}

/// Parse `sql` with the given grammar. Exactly one statement is accepted.
pub fn parse_with(dialect: &dyn SqlDialect, sql: &str) -> Result<Statement> {
    let mut parser = Parser::new(dialect).try_with_sql(sql).map_err(unparseable)?;
    while parser.consume_token(&Token::SemiColon) {}

    let statement = parser.parse_statement().map_err(unparseable)?;
    // sqlparser stops an UPDATE after WHERE; MySQL allows ORDER BY and LIMIT.
    let tail = match &statement {
        ast::Statement::Update { .. } => parse_update_tail(&mut parser)?,
        _ => UpdateTail::default(),
    };

    while parser.consume_token(&Token::SemiColon) {}
    let next = parser.peek_token();
    if next.token != Token::EOF {
        return Err(FormatError::Unparseable(format!(
            "expected 1 statement, found {}{}",
            next.token, next.location
        )));
    }

    let mut lowered = lower_statement(&statement)?;
    if let Statement::Update(update) = &mut lowered {
        update.order_by = lower_order_by(&tail.order_by)?;
        update.limit = lower_limit(tail.limit.as_ref(), None)?;
    }
    Ok(lowered)
}

fn unparseable(e: ParserError) -> FormatError {
    FormatError::Unparseable(e.to_string())
}

#[derive(Default)]
struct UpdateTail {
    order_by: Vec<ast::OrderByExpr>,
    limit: Option<ast::Expr>,
}

fn parse_update_tail(parser: &mut Parser<'_>) -> Result<UpdateTail> {
    let mut tail = UpdateTail::default();
    if parser.parse_keywords(&[Keyword::ORDER, Keyword::BY]) {
        tail.order_by = parser
            .parse_comma_separated(Parser::parse_order_by_expr)
            .map_err(unparseable)?;
    }
    if parser.parse_keyword(Keyword::LIMIT) {
        tail.limit = parser.parse_limit().map_err(unparseable)?;
    }
    Ok(tail)
}

pub fn lower_statement(statement: &ast::Statement) -> Result<Statement> {
    match statement {
        ast::Statement::Query(query) => lower_query(query),
        ast::Statement::Insert(insert) => lower_insert(insert),
        ast::Statement::Update {
            table,
            assignments,
            from,
            selection,
            returning,
            ..
        } => {
            if from.is_some() {
                return Err(unsupported("UPDATE ... FROM"));
            }
            if returning.is_some() {
                return Err(unsupported("RETURNING"));
            }
            Ok(Statement::Update(Box::new(Update {
                tables: vec![lower_table_with_joins(table)?],
                assignments: assignments.iter().map(|a| a.to_string()).collect(),
                selection: selection.as_ref().map(lower_expr).transpose()?,
                order_by: Vec::new(),
                limit: None,
            })))
        }
        ast::Statement::Delete(delete) => lower_delete(delete),
        _ => Err(unsupported("statement kind")),
    }
}

fn lower_query(query: &ast::Query) -> Result<Statement> {
    if query.with.is_some() {
        return Err(unsupported("WITH"));
    }
    if query.fetch.is_some() {
        return Err(unsupported("FETCH"));
    }
    if !query.locks.is_empty() {
        return Err(unsupported("locking clause"));
    }
    if !query.limit_by.is_empty() {
        return Err(unsupported("LIMIT BY"));
    }
    if query.for_clause.is_some() || query.settings.is_some() || query.format_clause.is_some() {
        return Err(unsupported("trailing query clause"));
    }

    let order_by = match &query.order_by {
        Some(order_by) => lower_order_by(&order_by.exprs)?,
        None => Vec::new(),
    };
    let limit = lower_limit(query.limit.as_ref(), query.offset.as_ref())?;

    let mut statement = lower_set_expr(&query.body)?;
    match &mut statement {
        Statement::Select(select) => {
            select.order_by = order_by;
            select.limit = limit;
        }
        Statement::Union(union) => {
            union.order_by = order_by;
            union.limit = limit;
        }
        _ if order_by.is_empty() && limit.is_none() => {}
        _ => return Err(unsupported("ORDER BY or LIMIT on this statement")),
    }
    Ok(statement)
}

fn lower_set_expr(body: &ast::SetExpr) -> Result<Statement> {
    match body {
        ast::SetExpr::Select(select) => Ok(Statement::Select(Box::new(lower_select(select)?))),
        // A parenthesized operand is printed without its parentheses, which
        // is only faithful when it carries no clauses of its own.
        ast::SetExpr::Query(query) => {
            if query.order_by.is_some() || query.limit.is_some() || query.offset.is_some() {
                return Err(unsupported("parenthesized query with ORDER BY or LIMIT"));
            }
            lower_query(query)
        }
        ast::SetExpr::SetOperation {
            op,
            set_quantifier,
            left,
            right,
            ..
        } => {
            if !matches!(op, ast::SetOperator::Union) {
                return Err(unsupported(op));
            }
            let all = match set_quantifier {
                ast::SetQuantifier::All => true,
                ast::SetQuantifier::Distinct | ast::SetQuantifier::None => false,
                other => return Err(unsupported(other)),
            };
            Ok(Statement::Union(Box::new(Union {
                left: lower_set_expr(left)?,
                right: lower_set_expr(right)?,
                all,
                order_by: Vec::new(),
                limit: None,
            })))
        }
        _ => Err(unsupported("query body")),
    }
}

fn lower_select(select: &ast::Select) -> Result<Select> {
    let distinct = match &select.distinct {
        None => false,
        Some(ast::Distinct::Distinct) => true,
        Some(ast::Distinct::On(_)) => return Err(unsupported("DISTINCT ON")),
    };
    if select.top.is_some() {
        return Err(unsupported("TOP"));
    }
    if select.into.is_some() {
        return Err(unsupported("SELECT INTO"));
    }
    if !select.lateral_views.is_empty() {
        return Err(unsupported("LATERAL VIEW"));
    }
    if !select.named_window.is_empty() {
        return Err(unsupported("WINDOW"));
    }
    if select.qualify.is_some() {
        return Err(unsupported("QUALIFY"));
    }
    if select.prewhere.is_some() || select.connect_by.is_some() {
        return Err(unsupported("PREWHERE or CONNECT BY"));
    }
    if !select.cluster_by.is_empty() || !select.distribute_by.is_empty() || !select.sort_by.is_empty()
    {
        return Err(unsupported("CLUSTER/DISTRIBUTE/SORT BY"));
    }
    if select.value_table_mode.is_some() {
        return Err(unsupported("SELECT AS VALUE"));
    }

    let group_by = match &select.group_by {
        ast::GroupByExpr::Expressions(exprs, modifiers) => {
            if !modifiers.is_empty() {
                return Err(unsupported("GROUP BY modifiers"));
            }
            exprs.iter().map(lower_expr).collect::<Result<Vec<_>>>()?
        }
        ast::GroupByExpr::All(_) => return Err(unsupported("GROUP BY ALL")),
    };

    Ok(Select {
        distinct,
        projection: select
            .projection
            .iter()
            .map(lower_select_item)
            .collect::<Result<Vec<_>>>()?,
        from: select
            .from
            .iter()
            .map(lower_table_with_joins)
            .collect::<Result<Vec<_>>>()?,
        selection: select.selection.as_ref().map(lower_expr).transpose()?,
        group_by,
        having: select.having.as_ref().map(lower_expr).transpose()?,
        order_by: Vec::new(),
        limit: None,
    })
}

fn lower_select_item(item: &ast::SelectItem) -> Result<SelectItem> {
    match item {
        ast::SelectItem::UnnamedExpr(expr) => Ok(SelectItem::Expr {
            expr: lower_expr(expr)?,
            alias: None,
        }),
        ast::SelectItem::ExprWithAlias { expr, alias } => Ok(SelectItem::Expr {
            expr: lower_expr(expr)?,
            alias: Some(alias.to_string()),
        }),
        other => Ok(SelectItem::Raw(other.to_string())),
    }
}

fn lower_insert(insert: &ast::Insert) -> Result<Statement> {
    if insert.ignore {
        return Err(unsupported("INSERT IGNORE"));
    }
    if insert.returning.is_some() {
        return Err(unsupported("RETURNING"));
    }
    if insert.table_alias.is_some() {
        return Err(unsupported("INSERT table alias"));
    }
    if insert.insert_alias.is_some() {
        return Err(unsupported("INSERT row alias"));
    }
    if let Some(priority) = &insert.priority {
        return Err(unsupported(priority));
    }
    if insert.partitioned.is_some() || !insert.after_columns.is_empty() {
        return Err(unsupported("INSERT ... PARTITION"));
    }
    if insert.or.is_some() || insert.overwrite || insert.table {
        return Err(unsupported("INSERT variant"));
    }

    let on_duplicate = match &insert.on {
        None => Vec::new(),
        Some(ast::OnInsert::DuplicateKeyUpdate(assignments)) => {
            assignments.iter().map(|a| a.to_string()).collect()
        }
        Some(_) => return Err(unsupported("ON CONFLICT")),
    };

    let query = insert
        .source
        .as_ref()
        .ok_or_else(|| unsupported("INSERT without a source"))?;
    let bare = query.with.is_none()
        && query.order_by.is_none()
        && query.limit.is_none()
        && query.offset.is_none();
    let source = match query.body.as_ref() {
        ast::SetExpr::Values(values) if bare => {
            if values.explicit_row {
                return Err(unsupported("VALUES ROW(...)"));
            }
            InsertSource::Values(
                values
                    .rows
                    .iter()
                    .map(|row| row.iter().map(lower_expr).collect::<Result<Vec<_>>>())
                    .collect::<Result<Vec<_>>>()?,
            )
        }
        _ => InsertSource::Query(lower_query(query)?),
    };

    Ok(Statement::Insert(Box::new(Insert {
        replace: insert.replace_into,
        table: insert.table_name.to_string(),
        columns: insert.columns.iter().map(|c| c.to_string()).collect(),
        source,
        on_duplicate,
    })))
}

fn lower_delete(delete: &ast::Delete) -> Result<Statement> {
    if !delete.tables.is_empty() {
        return Err(unsupported("multi-table DELETE"));
    }
    if delete.using.is_some() {
        return Err(unsupported("DELETE ... USING"));
    }
    if delete.returning.is_some() {
        return Err(unsupported("RETURNING"));
    }

    let from = match &delete.from {
        ast::FromTable::WithFromKeyword(tables) | ast::FromTable::WithoutKeyword(tables) => tables,
    };

    Ok(Statement::Delete(Box::new(Delete {
        tables: from
            .iter()
            .map(lower_table_with_joins)
            .collect::<Result<Vec<_>>>()?,
        selection: delete.selection.as_ref().map(lower_expr).transpose()?,
        order_by: lower_order_by(&delete.order_by)?,
        limit: lower_limit(delete.limit.as_ref(), None)?,
    })))
}

fn lower_order_by(exprs: &[ast::OrderByExpr]) -> Result<Vec<OrderItem>> {
    exprs
        .iter()
        .map(|item| {
            if item.nulls_first.is_some() {
                return Err(unsupported("NULLS FIRST/LAST"));
            }
            Ok(OrderItem {
                expr: lower_expr(&item.expr)?,
                desc: item.asc == Some(false),
            })
        })
        .collect()
}

fn lower_limit(limit: Option<&ast::Expr>, offset: Option<&ast::Offset>) -> Result<Option<Limit>> {
    if limit.is_none() && offset.is_none() {
        return Ok(None);
    }
    Ok(Some(Limit {
        row_count: limit.map(lower_expr).transpose()?,
        offset: offset.map(|o| lower_expr(&o.value)).transpose()?,
    }))
}

/// Fold a table and its joins into a left-deep join chain.
fn lower_table_with_joins(table: &ast::TableWithJoins) -> Result<TableExpr> {
    let mut acc = lower_table_factor(&table.relation)?;
    for join in &table.joins {
        let (kind, constraint) = match &join.join_operator {
            ast::JoinOperator::Inner(c) => (JoinKind::Inner, lower_join_constraint(c)?),
            ast::JoinOperator::LeftOuter(c) => (JoinKind::Left, lower_join_constraint(c)?),
            ast::JoinOperator::RightOuter(c) => (JoinKind::Right, lower_join_constraint(c)?),
            ast::JoinOperator::FullOuter(c) => (JoinKind::Full, lower_join_constraint(c)?),
            ast::JoinOperator::CrossJoin => (JoinKind::Cross, None),
            _ => return Err(unsupported("join operator")),
        };
        acc = TableExpr::Join {
            left: Box::new(acc),
            kind,
            right: Box::new(lower_table_factor(&join.relation)?),
            constraint,
        };
    }
    Ok(acc)
}

fn lower_join_constraint(constraint: &ast::JoinConstraint) -> Result<Option<JoinConstraint>> {
    Ok(match constraint {
        ast::JoinConstraint::On(expr) => Some(JoinConstraint::On(lower_expr(expr)?)),
        ast::JoinConstraint::Using(columns) => Some(JoinConstraint::Using(
            columns.iter().map(|c| c.to_string()).collect(),
        )),
        ast::JoinConstraint::Natural => Some(JoinConstraint::Natural),
        ast::JoinConstraint::None => None,
    })
}

fn lower_table_factor(factor: &ast::TableFactor) -> Result<TableExpr> {
    match factor {
        ast::TableFactor::Table {
            name,
            alias,
            args,
            with_hints,
            version,
            partitions,
            with_ordinality,
        } => {
            if args.is_some() {
                return Err(unsupported("table function"));
            }
            if !with_hints.is_empty() {
                return Err(unsupported("table hints"));
            }
            if !partitions.is_empty() {
                return Err(unsupported("PARTITION selection"));
            }
            if version.is_some() || *with_ordinality {
                return Err(unsupported("table version or WITH ORDINALITY"));
            }
            Ok(TableExpr::Plain {
                name: name.to_string(),
                alias: alias.as_ref().map(|a| a.to_string()),
            })
        }
        ast::TableFactor::Derived {
            lateral,
            subquery,
            alias,
            ..
        } => {
            if *lateral {
                return Err(unsupported("LATERAL"));
            }
            Ok(TableExpr::Derived {
                subquery: lower_query(subquery)?,
                alias: alias.as_ref().map(|a| a.to_string()),
            })
        }
        ast::TableFactor::NestedJoin {
            table_with_joins,
            alias,
            ..
        } => Ok(TableExpr::Group {
            members: vec![lower_table_with_joins(table_with_joins)?],
            alias: alias.as_ref().map(|a| a.to_string()),
        }),
        _ => Err(unsupported("table expression")),
    }
}

fn is_comparison(op: &ast::BinaryOperator) -> bool {
    matches!(
        op,
        ast::BinaryOperator::Eq
            | ast::BinaryOperator::NotEq
            | ast::BinaryOperator::Lt
            | ast::BinaryOperator::LtEq
            | ast::BinaryOperator::Gt
            | ast::BinaryOperator::GtEq
            | ast::BinaryOperator::Spaceship
    )
}

/// Expressions are kept as their own serialization unless they are boolean
/// connectives, comparisons or subqueries, which the renderer lays out.
fn lower_expr(expr: &ast::Expr) -> Result<Expr> {
    match expr {
        ast::Expr::BinaryOp {
            left,
            op: ast::BinaryOperator::And,
            right,
        } => Ok(Expr::And {
            left: Box::new(lower_expr(left)?),
            right: Box::new(lower_expr(right)?),
            text: expr.to_string(),
        }),
        ast::Expr::BinaryOp {
            left,
            op: ast::BinaryOperator::Or,
            right,
        } => Ok(Expr::Or {
            left: Box::new(lower_expr(left)?),
            right: Box::new(lower_expr(right)?),
            text: expr.to_string(),
        }),
        ast::Expr::BinaryOp { left, op, right } if is_comparison(op) => Ok(Expr::Comparison {
            left: Box::new(lower_expr(left)?),
            op: op.to_string(),
            right: Box::new(lower_expr(right)?),
        }),
        ast::Expr::InSubquery {
            expr: left,
            subquery,
            negated,
        } => Ok(Expr::Comparison {
            left: Box::new(lower_expr(left)?),
            op: if *negated { "NOT IN" } else { "IN" }.to_string(),
            right: Box::new(Expr::Subquery(Box::new(lower_query(subquery)?))),
        }),
        ast::Expr::Exists { subquery, negated } => Ok(Expr::Exists {
            negated: *negated,
            subquery: Box::new(lower_query(subquery)?),
        }),
        ast::Expr::Subquery(subquery) => Ok(Expr::Subquery(Box::new(lower_query(subquery)?))),
        other => Ok(Expr::Raw(other.to_string())),
    }
}
