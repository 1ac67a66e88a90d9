use crate::keywords::upper_keywords;
use crate::tree::{
    Delete, Expr, Insert, InsertSource, JoinConstraint, Limit, OrderItem, Select, SelectItem,
    Statement, TableExpr, Union, Update,
};

/// Render a statement tree as indented text, one clause keyword per line.
pub fn render(statement: &Statement, indent: usize) -> String {
    let mut buf = RenderBuffer::new(indent);
    buf.statement(statement, 0);
    buf.finish()
}

/// Output text under construction. Every line is padded with
/// `depth * indent` spaces and terminated by `\n`.
#[derive(Debug)]
pub struct RenderBuffer {
    out: String,
    indent: usize,
}

impl RenderBuffer {
    pub fn new(indent: usize) -> Self {
        Self {
            out: String::with_capacity(256),
            indent,
        }
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn pad(&self, depth: usize) -> String {
        " ".repeat(depth * self.indent)
    }

    fn line(&mut self, depth: usize, text: &str) {
        let pad = self.pad(depth);
        self.out.push_str(&pad);
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// One line per item, each but the last terminated by a comma.
    fn list(&mut self, depth: usize, items: &[String]) {
        for (i, item) in items.iter().enumerate() {
            if i + 1 < items.len() {
                self.line(depth, &format!("{},", item));
            } else {
                self.line(depth, item);
            }
        }
    }

    /// Put a comma at the end of the last emitted line.
    fn terminate_with_comma(&mut self) {
        if self.out.ends_with('\n') {
            self.out.pop();
            self.out.push_str(",\n");
        }
    }

    pub fn statement(&mut self, statement: &Statement, depth: usize) {
        match statement {
            Statement::Select(s) => self.select(s, depth),
            Statement::Insert(s) => self.insert(s, depth),
            Statement::Update(s) => self.update(s, depth),
            Statement::Delete(s) => self.delete(s, depth),
            Statement::Union(s) => self.union(s, depth),
        }
    }

    fn select(&mut self, s: &Select, depth: usize) {
        self.line(depth, if s.distinct { "SELECT DISTINCT" } else { "SELECT" });

        let items: Vec<String> = s
            .projection
            .iter()
            .map(|item| self.select_item(item, depth + 1))
            .collect();
        self.list(depth + 1, &items);

        if !s.from.is_empty() {
            self.line(depth, "FROM");
            self.tables(&s.from, depth + 1, depth);
        }

        if let Some(selection) = &s.selection {
            self.line(depth, "WHERE");
            self.filter(selection, depth + 1, true);
        }

        if !s.group_by.is_empty() {
            self.line(depth, "GROUP BY");
            let items: Vec<String> = s.group_by.iter().map(|e| self.expr(e, depth + 1)).collect();
            self.list(depth + 1, &items);
        }

        if let Some(having) = &s.having {
            self.line(depth, "HAVING");
            self.filter(having, depth + 1, true);
        }

        self.order_by(&s.order_by, depth);
        self.limit(s.limit.as_ref(), depth);
    }

    fn select_item(&self, item: &SelectItem, depth: usize) -> String {
        match item {
            SelectItem::Expr { expr, alias } => {
                let rendered = self.expr(expr, depth);
                match alias {
                    Some(alias) => format!("{} AS {}", rendered, alias),
                    None => rendered,
                }
            }
            SelectItem::Raw(text) => text.clone(),
        }
    }

    fn insert(&mut self, s: &Insert, depth: usize) {
        self.line(depth, if s.replace { "REPLACE INTO" } else { "INSERT INTO" });
        self.line(depth + 1, &s.table);

        if !s.columns.is_empty() {
            self.line(depth, "(");
            self.list(depth + 1, &s.columns);
            self.line(depth, ")");
        }

        match &s.source {
            InsertSource::Values(rows) => {
                self.line(depth, "VALUES");
                let tuples: Vec<String> = rows
                    .iter()
                    .map(|row| {
                        let values: Vec<String> =
                            row.iter().map(|e| self.expr(e, depth + 1)).collect();
                        format!("({})", values.join(", "))
                    })
                    .collect();
                self.list(depth + 1, &tuples);
            }
            InsertSource::Query(query) => self.statement(query, depth),
        }

        if !s.on_duplicate.is_empty() {
            self.line(depth, "ON DUPLICATE KEY UPDATE");
            let assignments: Vec<String> =
                s.on_duplicate.iter().map(|a| upper_keywords(a)).collect();
            self.list(depth + 1, &assignments);
        }
    }

    fn update(&mut self, s: &Update, depth: usize) {
        self.line(depth, "UPDATE");
        self.tables(&s.tables, depth + 1, depth);

        self.line(depth, "SET");
        let assignments: Vec<String> = s.assignments.iter().map(|a| upper_keywords(a)).collect();
        self.list(depth + 1, &assignments);

        if let Some(selection) = &s.selection {
            self.line(depth, "WHERE");
            self.filter(selection, depth + 1, true);
        }

        self.order_by(&s.order_by, depth);
        self.limit(s.limit.as_ref(), depth);
    }

    fn delete(&mut self, s: &Delete, depth: usize) {
        self.line(depth, "DELETE FROM");
        self.tables(&s.tables, depth + 1, depth);

        if let Some(selection) = &s.selection {
            self.line(depth, "WHERE");
            self.filter(selection, depth + 1, true);
        }

        self.order_by(&s.order_by, depth);
        self.limit(s.limit.as_ref(), depth);
    }

    fn union(&mut self, s: &Union, depth: usize) {
        self.statement(&s.left, depth);
        self.line(depth, if s.all { "UNION ALL" } else { "UNION" });
        self.statement(&s.right, depth);

        self.order_by(&s.order_by, depth);
        self.limit(s.limit.as_ref(), depth);
    }

    fn order_by(&mut self, items: &[OrderItem], depth: usize) {
        if items.is_empty() {
            return;
        }

        self.line(depth, "ORDER BY");
        let rendered: Vec<String> = items
            .iter()
            .map(|item| {
                let expr = self.expr(&item.expr, depth + 1);
                if item.desc {
                    format!("{} DESC", expr)
                } else {
                    expr
                }
            })
            .collect();
        self.list(depth + 1, &rendered);
    }

    fn limit(&mut self, limit: Option<&Limit>, depth: usize) {
        let Some(limit) = limit else {
            return;
        };

        if let Some(row_count) = &limit.row_count {
            self.line(depth, "LIMIT");
            let value = self.expr(row_count, depth + 1);
            self.line(depth + 1, &value);
        }
        if let Some(offset) = &limit.offset {
            self.line(depth, "OFFSET");
            let value = self.expr(offset, depth + 1);
            self.line(depth + 1, &value);
        }
    }

    /// Table expressions start on `level`; `depth` is the enclosing
    /// statement's depth, which nested statements are rendered relative to.
    fn tables(&mut self, tables: &[TableExpr], level: usize, depth: usize) {
        for (i, table) in tables.iter().enumerate() {
            self.table(table, level, depth);
            if i + 1 < tables.len() {
                self.terminate_with_comma();
            }
        }
    }

    fn table(&mut self, table: &TableExpr, level: usize, depth: usize) {
        match table {
            TableExpr::Plain { name, alias } => {
                self.line(level, &with_alias(name, alias.as_deref()));
            }
            TableExpr::Derived { subquery, alias } => {
                self.line(level, "(");
                self.statement(subquery, depth + 1);
                self.line(level, &with_alias(")", alias.as_deref()));
            }
            TableExpr::Join {
                left,
                kind,
                right,
                constraint,
            } => {
                self.table(left, level, depth);
                let natural = matches!(constraint, Some(JoinConstraint::Natural));
                self.line(level, kind.keyword(natural));
                self.table(right, level, depth);

                match constraint {
                    Some(JoinConstraint::On(condition)) => {
                        let condition = self.expr(condition, level + 1);
                        self.line(level + 1, &format!("ON {}", condition));
                    }
                    Some(JoinConstraint::Using(columns)) => {
                        self.line(level + 1, &format!("USING ({})", columns.join(", ")));
                    }
                    Some(JoinConstraint::Natural) | None => {}
                }
            }
            TableExpr::Group { members, alias } => {
                self.line(level, "(");
                self.tables(members, level + 1, depth + 1);
                self.line(level, &with_alias(")", alias.as_deref()));
            }
        }
    }

    /// WHERE/HAVING body: each top-level AND conjunct on its own line. The
    /// right side of an OR is printed as one line without further splitting.
    fn filter(&mut self, expr: &Expr, level: usize, first: bool) {
        match expr {
            Expr::And { left, right, .. } => {
                self.filter(left, level, first);
                self.filter(right, level, false);
            }
            Expr::Or { left, right, .. } => {
                self.filter(left, level, first);
                let right = self.expr(right, level);
                self.line(level, &format!("OR {}", right));
            }
            _ => {
                let rendered = self.expr(expr, level);
                if first {
                    self.line(level, &rendered);
                } else {
                    self.line(level, &format!("AND {}", rendered));
                }
            }
        }
    }

    /// Render an expression starting on a line at `depth`. Subqueries open on
    /// that line and close on a line of their own at the same depth.
    pub fn expr(&self, expr: &Expr, depth: usize) -> String {
        match expr {
            Expr::Exists { negated, subquery } => {
                let keyword = if *negated { "NOT EXISTS" } else { "EXISTS" };
                format!(
                    "{} (\n{}{})",
                    keyword,
                    self.nested(subquery, depth + 1),
                    self.pad(depth)
                )
            }
            Expr::Subquery(subquery) => {
                format!("(\n{}{})", self.nested(subquery, depth + 1), self.pad(depth))
            }
            Expr::Comparison { left, op, right } => {
                let text = format!("{} {} {}", self.expr(left, depth), op, self.expr(right, depth));
                upper_keywords(&text)
            }
            Expr::And { text, .. } | Expr::Or { text, .. } | Expr::Raw(text) => {
                upper_keywords(text)
            }
        }
    }

    fn nested(&self, statement: &Statement, depth: usize) -> String {
        let mut buf = RenderBuffer::new(self.indent);
        buf.statement(statement, depth);
        buf.finish()
    }
}

fn with_alias(text: &str, alias: Option<&str>) -> String {
    match alias {
        Some(alias) => format!("{} {}", text, alias),
        None => text.to_string(),
    }
}
