//! Namespace to implementation-path mapping

use std::path::PathBuf;

use crate::common::config::SourceConfig;

/// Strategy for deriving the implementation file of a test namespace
pub trait SourceMapper {
    /// Filesystem path of the implementation source for a namespace
    fn implementation_path(&self, namespace: &str) -> PathBuf;
}

/// Conventional mapping: strip the test suffix from the final segment,
/// dots become directory separators, dashes become underscores.
#[derive(Debug, Clone)]
pub struct ConventionMapper {
    root: PathBuf,
    extension: String,
    test_suffix: String,
}

impl ConventionMapper {
    pub fn new(root: PathBuf, extension: String, test_suffix: String) -> Self {
        Self {
            root,
            extension,
            test_suffix,
        }
    }

    pub fn from_config(source: &SourceConfig) -> Self {
        Self::new(
            source.root.clone(),
            source.extension.clone(),
            source.test_suffix.clone(),
        )
    }

    /// Implementation namespace for a test namespace
    pub fn implementation_namespace(&self, namespace: &str) -> String {
        namespace
            .strip_suffix(&self.test_suffix)
            .unwrap_or(namespace)
            .to_string()
    }
}

impl SourceMapper for ConventionMapper {
    fn implementation_path(&self, namespace: &str) -> PathBuf {
        let implementation = self.implementation_namespace(namespace);
        let mut path = self.root.clone();
        let segments: Vec<&str> = implementation.split('.').collect();
        for (i, segment) in segments.iter().enumerate() {
            let part = segment.replace('-', "_");
            if i + 1 == segments.len() {
                path.push(format!("{}.{}", part, self.extension));
            } else {
                path.push(part);
            }
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> ConventionMapper {
        ConventionMapper::new(PathBuf::from("src"), "clj".to_string(), "-test".to_string())
    }

    #[test]
    fn test_strips_suffix_and_maps_separators() {
        assert_eq!(
            mapper().implementation_path("my.app.core-test"),
            PathBuf::from("src/my/app/core.clj")
        );
    }

    #[test]
    fn test_inner_dashes_become_underscores() {
        assert_eq!(
            mapper().implementation_path("my.app.string-utils-test"),
            PathBuf::from("src/my/app/string_utils.clj")
        );
    }

    #[test]
    fn test_non_test_namespace_maps_unchanged() {
        assert_eq!(
            mapper().implementation_path("my.app.core"),
            PathBuf::from("src/my/app/core.clj")
        );
        assert_eq!(mapper().implementation_namespace("my.app.core"), "my.app.core");
    }

    #[test]
    fn test_custom_root_and_extension() {
        let mapper =
            ConventionMapper::new(PathBuf::from("lib"), "cljs".to_string(), "-spec".to_string());
        assert_eq!(
            mapper.implementation_path("app.views-spec"),
            PathBuf::from("lib/app/views.cljs")
        );
    }
}
