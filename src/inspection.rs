//! Source-model inspection SPI.
//!
//! Heap analysis sometimes wants answers only a source model can give: is this
//! class a test class, does it extend some framework type, does it carry an
//! annotation. The dump itself cannot answer those questions, so they are routed
//! through this trait and answered by whatever environment embeds the library -
//! an IDE with a full project model, or nothing at all.
//!
//! Every method has a conservative default ([`NullSourceInspection`] inherits all
//! of them), so the library never requires an environment: a heap dump loaded
//! standalone simply gets negative answers everywhere.

/// Oracle over the embedding environment's source model.
///
/// Implementations must be cheap to call repeatedly and must not block on user
/// interaction; queries may consult them per class.
pub trait SourceInspection: Send + Sync {
    /// Whether the named class is part of the project's test sources.
    fn is_test_class(&self, class_name: &str) -> bool {
        let _ = class_name;
        false
    }

    /// Whether the named class is an applet-style entry point.
    fn is_applet_class(&self, class_name: &str) -> bool {
        let _ = class_name;
        false
    }

    /// The fully qualified class declared at a source position, if any.
    fn class_at_position(&self, file: &str, line: u32, column: u32) -> Option<String> {
        let _ = (file, line, column);
        None
    }

    /// The method declared at a source position, if any.
    fn method_at_position(&self, file: &str, line: u32, column: u32) -> Option<String> {
        let _ = (file, line, column);
        None
    }

    /// Whether `class_name` is a subtype of `super_name` in the source model.
    ///
    /// This covers relationships the dump cannot express, such as interfaces.
    fn is_subtype_of(&self, class_name: &str, super_name: &str) -> bool {
        let _ = (class_name, super_name);
        false
    }

    /// Whether the named class carries the given annotation.
    fn has_annotation(&self, class_name: &str, annotation: &str) -> bool {
        let _ = (class_name, annotation);
        false
    }
}

/// The environment-less inspection: every answer is negative.
#[derive(Debug, Default)]
pub struct NullSourceInspection;

impl SourceInspection for NullSourceInspection {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_inspection_answers_negatively() {
        let inspection = NullSourceInspection;
        assert!(!inspection.is_test_class("com.example.FooTest"));
        assert!(!inspection.is_applet_class("com.example.App"));
        assert!(inspection.class_at_position("Foo.java", 1, 1).is_none());
        assert!(inspection.method_at_position("Foo.java", 1, 1).is_none());
        assert!(!inspection.is_subtype_of("A", "B"));
        assert!(!inspection.has_annotation("A", "Deprecated"));
    }
}
