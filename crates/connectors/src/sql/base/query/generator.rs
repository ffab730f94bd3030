use crate::sql::base::{
    metadata::table::{KeySpec, TableSpec},
    query::dialect::Dialect,
};
use model::{execution::mapping::SURROGATE_KEY_COLUMN, records::dataset::ColumnDef};

/// Upper bound on rows per INSERT regardless of parameter headroom.
pub const MAX_ROWS_PER_INSERT: usize = 10_000;

pub struct QueryGenerator<'a> {
    dialect: &'a dyn Dialect,
}

impl<'a> QueryGenerator<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self { dialect }
    }

    fn ident(&self, name: &str) -> String {
        self.dialect.quote_identifier(name)
    }

    fn ident_list<'s>(&self, names: impl Iterator<Item = &'s str>) -> String {
        names.map(|n| self.ident(n)).collect::<Vec<_>>().join(", ")
    }

    pub fn create_table(&self, spec: &TableSpec) -> String {
        let mut parts = Vec::with_capacity(spec.columns.len() + 2);
        if spec.key == KeySpec::Surrogate {
            parts.push(self.dialect.surrogate_key_definition(SURROGATE_KEY_COLUMN));
        }

        parts.extend(spec.columns.iter().map(|col| {
            format!(
                "{} {}",
                self.ident(&col.name),
                self.dialect.render_data_type(&col.data_type)
            )
        }));

        if let KeySpec::Natural(keys) = &spec.key {
            parts.push(format!(
                "PRIMARY KEY ({})",
                self.ident_list(keys.iter().map(String::as_str))
            ));
        }

        format!("CREATE TABLE {} ({})", self.ident(&spec.name), parts.join(", "))
    }

    pub fn drop_table(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {}", self.ident(table))
    }

    pub fn rename_table(&self, from: &str, to: &str) -> String {
        format!("ALTER TABLE {} RENAME TO {}", self.ident(from), self.ident(to))
    }

    /// Full structural and data copy, used for backups.
    pub fn copy_table(&self, source: &str, target: &str) -> String {
        format!(
            "CREATE TABLE {} AS SELECT * FROM {}",
            self.ident(target),
            self.ident(source)
        )
    }

    /// Copies `columns` from `source` into `target`, casting each value to
    /// the column's new type.
    pub fn copy_columns(&self, source: &str, target: &str, columns: &[ColumnDef]) -> String {
        let names = self.ident_list(columns.iter().map(|c| c.name.as_str()));
        let casts = columns
            .iter()
            .map(|c| {
                format!(
                    "{}::{}",
                    self.ident(&c.name),
                    self.dialect.render_data_type(&c.data_type)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "INSERT INTO {} ({names}) SELECT {casts} FROM {}",
            self.ident(target),
            self.ident(source)
        )
    }

    /// Multi-row INSERT with one typed placeholder per value.
    pub fn insert_rows(&self, table: &str, columns: &[ColumnDef], row_count: usize) -> String {
        let names = self.ident_list(columns.iter().map(|c| c.name.as_str()));
        let types = columns
            .iter()
            .map(|c| self.dialect.render_data_type(&c.data_type))
            .collect::<Vec<_>>();

        let mut index = 0;
        let tuples = (0..row_count)
            .map(|_| {
                let row = types
                    .iter()
                    .map(|ty| {
                        let placeholder = self.dialect.get_placeholder(index);
                        index += 1;
                        format!("{placeholder}::{ty}")
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({row})")
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!("INSERT INTO {} ({names}) VALUES {tuples}", self.ident(table))
    }

    pub fn count_rows(&self, table: &str) -> String {
        format!("SELECT COUNT(*) FROM {}", self.ident(table))
    }

    /// Rows per INSERT so that one statement stays under the parameter limit.
    pub fn rows_per_insert(&self, column_count: usize) -> usize {
        if column_count == 0 {
            return MAX_ROWS_PER_INSERT;
        }
        (self.dialect.max_params() / column_count).clamp(1, MAX_ROWS_PER_INSERT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::base::query::dialect::Postgres;
    use model::core::data_type::DataType;

    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("credit_number", DataType::String),
            ColumnDef::new("amount", DataType::Float),
        ]
    }

    #[test]
    fn create_table_with_natural_key() {
        let dialect = Postgres;
        let generator = QueryGenerator::new(&dialect);
        let spec = TableSpec::new(
            "wb_credit_statements",
            columns(),
            KeySpec::Natural(vec!["credit_number".into()]),
        );

        assert_eq!(
            generator.create_table(&spec),
            r#"CREATE TABLE "wb_credit_statements" ("credit_number" TEXT, "amount" DOUBLE PRECISION, PRIMARY KEY ("credit_number"))"#
        );
    }

    #[test]
    fn create_table_with_surrogate_key() {
        let dialect = Postgres;
        let generator = QueryGenerator::new(&dialect);
        let spec = TableSpec::new("wb_loan_statements", columns(), KeySpec::Surrogate);

        assert!(
            generator
                .create_table(&spec)
                .starts_with(r#"CREATE TABLE "wb_loan_statements" ("row_id" BIGSERIAL PRIMARY KEY, "credit_number" TEXT"#)
        );
    }

    #[test]
    fn insert_uses_typed_placeholders() {
        let dialect = Postgres;
        let generator = QueryGenerator::new(&dialect);
        assert_eq!(
            generator.insert_rows("t", &columns(), 2),
            r#"INSERT INTO "t" ("credit_number", "amount") VALUES ($1::TEXT, $2::DOUBLE PRECISION), ($3::TEXT, $4::DOUBLE PRECISION)"#
        );
    }

    #[test]
    fn copy_columns_casts_to_new_types() {
        let dialect = Postgres;
        let generator = QueryGenerator::new(&dialect);
        assert_eq!(
            generator.copy_columns("t", "t_new", &columns()),
            r#"INSERT INTO "t_new" ("credit_number", "amount") SELECT "credit_number"::TEXT, "amount"::DOUBLE PRECISION FROM "t""#
        );
    }

    #[test]
    fn chunk_size_respects_parameter_limit() {
        let dialect = Postgres;
        let generator = QueryGenerator::new(&dialect);
        assert_eq!(generator.rows_per_insert(2), 10_000);
        assert_eq!(generator.rows_per_insert(100), 655);
        assert_eq!(generator.rows_per_insert(70_000), 1);
    }

    #[test]
    fn identifiers_are_quoted() {
        let dialect = Postgres;
        let generator = QueryGenerator::new(&dialect);
        assert_eq!(generator.drop_table(r#"we"ird"#), r#"DROP TABLE IF EXISTS "we""ird""#);
    }
}
