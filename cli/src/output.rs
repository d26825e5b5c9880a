//! Output formatting

use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn render<T: Serialize>(&self, data: &T) -> Result<String, String> {
        match self {
            OutputFormat::Json => serde_json::to_string_pretty(data).map_err(|e| e.to_string()),
            OutputFormat::Yaml => serde_yaml::to_string(data).map_err(|e| e.to_string()),
        }
    }

    pub fn print<T: Serialize>(&self, data: &T) -> Result<(), String> {
        println!("{}", self.render(data)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_render() {
        let data = json!({"fvTenant": {"attributes": {"name": "prod"}}});
        let rendered = OutputFormat::Json.render(&data).unwrap();
        assert!(rendered.contains("\"name\": \"prod\""));

        let rendered = OutputFormat::Yaml.render(&data).unwrap();
        assert!(rendered.contains("name: prod"));
    }

    #[test]
    fn test_render_failure_is_returned() {
        // JSON object keys must be strings
        let mut data = BTreeMap::new();
        data.insert(vec![1u8, 2], "criterion");

        assert!(OutputFormat::Json.render(&data).is_err());
        assert!(OutputFormat::Json.print(&data).is_err());
    }
}
