// Import ordering
//
// Grouping standard library and third-party imports is left to whoever renders
// the output; sorting here is plain lexicographic order on the path.

use crate::parser::ImportSpec;

/// Stable sort of import specs by path
pub fn sort_imports(imports: &mut [ImportSpec]) {
    imports.sort_by(|a, b| a.path.cmp(&b.path));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Ident;

    fn paths(imports: &[ImportSpec]) -> Vec<&str> {
        imports.iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn test_sort_lexicographic() {
        let mut imports = vec![
            ImportSpec::new("fmt"),
            ImportSpec::new("github.com/z/a"),
            ImportSpec::new("encoding/json"),
        ];
        sort_imports(&mut imports);
        assert_eq!(paths(&imports), vec!["encoding/json", "fmt", "github.com/z/a"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut aliased = ImportSpec::new("fmt");
        aliased.name = Some(Ident::new("f"));
        let mut imports = vec![ImportSpec::new("os"), aliased, ImportSpec::new("fmt")];
        sort_imports(&mut imports);
        assert_eq!(paths(&imports), vec!["fmt", "fmt", "os"]);
        assert!(imports[0].name.is_some());
        assert!(imports[1].name.is_none());
    }

    #[test]
    fn test_sort_empty() {
        let mut imports: Vec<ImportSpec> = Vec::new();
        sort_imports(&mut imports);
        assert!(imports.is_empty());
    }
}
