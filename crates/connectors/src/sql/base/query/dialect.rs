use model::core::data_type::DataType;

pub trait Dialect: Send + Sync {
    /// Wraps an identifier (like a table or column name) in the correct
    /// quotation marks for the dialect.
    fn quote_identifier(&self, ident: &str) -> String;

    /// Returns the placeholder for the zero-based parameter `index`.
    fn get_placeholder(&self, index: usize) -> String;

    /// Renders a `DataType` into a database-specific SQL type string.
    fn render_data_type(&self, data_type: &DataType) -> String;

    /// Column definition of a generated, auto-incrementing key.
    fn surrogate_key_definition(&self, column: &str) -> String;

    /// Largest number of bind parameters a single statement may carry.
    fn max_params(&self) -> usize;

    fn name(&self) -> String;
}

#[derive(Debug, Clone, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn quote_identifier(&self, ident: &str) -> String {
        format!(r#""{}""#, ident.replace('"', "\"\""))
    }

    fn get_placeholder(&self, index: usize) -> String {
        // PostgreSQL uses $1, $2, etc.
        format!("${}", index + 1)
    }

    fn render_data_type(&self, data_type: &DataType) -> String {
        data_type.postgres_name().into_owned()
    }

    fn surrogate_key_definition(&self, column: &str) -> String {
        format!("{} BIGSERIAL PRIMARY KEY", self.quote_identifier(column))
    }

    fn max_params(&self) -> usize {
        65_535
    }

    fn name(&self) -> String {
        "PostgreSQL".into()
    }
}
