mod tests {
    use crate::*;
    use twig_core::error::{ErrorKind, error_kind};

    fn stdlib() -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        twig_stdlib::register_stdlib_modules(&mut registry).expect("stdlib registers");
        registry
    }

    #[test]
    fn test_sanitize_path_allows_simple_relative() {
        let p = sanitize_path("foo/bar.json").expect("relative path should be allowed");
        assert_eq!(p, PathBuf::from("foo/bar.json"));
    }

    #[test]
    fn test_sanitize_path_rejects_parent_dir() {
        let err = sanitize_path("foo/../bar.json").unwrap_err();
        assert!(err.to_string().contains("Parent directory components"));
    }

    #[test]
    fn test_cli_args_parse_call() {
        let args = CliArgs::try_parse_from(["twig", "--format", "inspect", "call", "data.take", "2", "[1]"])
            .expect("should parse");
        assert_eq!(args.format, OutputFormat::Inspect);
        match args.command {
            Commands::Call { function, args } => {
                assert_eq!(function, "data.take");
                assert_eq!(args, vec!["2".to_string(), "[1]".to_string()]);
            }
            other => panic!("expected call command, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_args_reject_parent_dir_in_inspect() {
        assert!(CliArgs::try_parse_from(["twig", "inspect", "../secret.json"]).is_err());
    }

    #[test]
    fn test_document_format_from_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.JSON")).ok(), Some(DocumentFormat::Json));
        assert_eq!(DocumentFormat::from_path(Path::new("a.yml")).ok(), Some(DocumentFormat::Yaml));
        assert_eq!(DocumentFormat::from_path(Path::new("a.toml")).ok(), Some(DocumentFormat::Toml));
        assert!(DocumentFormat::from_path(Path::new("a.txt")).is_err());
    }

    #[test]
    fn test_call_function_fills_defaults() -> Result<()> {
        let registry = stdlib();
        let args = vec![r#"{"a": {"b": 2}}"#.to_string(), r#"["a", "b"]"#.to_string()];
        let value = call_function(&registry, EvalConfig::default(), "data.get_in", &args)?;
        assert_eq!(value, Value::Long(2));
        assert_eq!(render(&value, OutputFormat::Json)?, "2");
        Ok(())
    }

    #[test]
    fn test_call_function_reports_missing_member() {
        let err = call_function(&stdlib(), EvalConfig::default(), "data.nope", &[]).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::IllegalAccess));
    }

    #[test]
    fn test_function_results_are_not_serializable() -> Result<()> {
        let registry = stdlib();
        let size = registry.resolve("data.size")?;
        let err = render(&size, OutputFormat::Json).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::NotSerializable));
        assert_eq!(render(&size, OutputFormat::Inspect)?, "function size");
        Ok(())
    }

    #[test]
    fn test_list_lines_describe_signatures() -> Result<()> {
        let registry = stdlib();
        let modules = list_lines(&registry, None)?;
        assert!(modules.iter().any(|line| line.starts_with("data")));
        let functions = list_lines(&registry, Some("data"))?;
        assert!(functions.contains(&"slice(xs: list, start: long = 0, end: long = nil) -> list".to_string()));
        Ok(())
    }
}
