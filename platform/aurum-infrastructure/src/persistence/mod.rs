pub mod memory;
pub mod postgres_quotes;

/// Plain or schema-qualified SQL identifier (`table` or `schema.table`).
pub fn validate_table_name(table: &str) -> Result<(), String> {
    if table.is_empty() {
        return Err("table name is empty".to_string());
    }
    let parts: Vec<&str> = table.split('.').collect();
    if parts.is_empty() || parts.len() > 2 {
        return Err(format!("invalid table name: {table}"));
    }
    for part in parts {
        let mut chars = part.chars();
        let first = match chars.next() {
            Some(ch) => ch,
            None => return Err(format!("invalid table name: {table}")),
        };
        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(format!("invalid table name: {table}"));
        }
        if !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
            return Err(format!("invalid table name: {table}"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_table_name;

    #[test]
    fn validate_table_name_accepts_schema() {
        assert!(validate_table_name("quotes").is_ok());
        assert!(validate_table_name("public.quotes").is_ok());
        assert!(validate_table_name("_staging.q2").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("a.b.c").is_err());
        assert!(validate_table_name("public.").is_err());
        assert!(validate_table_name("1quotes").is_err());
        assert!(validate_table_name("quotes;drop").is_err());
    }
}
