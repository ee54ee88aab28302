//! Final output assembly: banner, package clause, rendered groups.

use tracing::info;

use crate::error::EnumgenResult;
use crate::format::Formatter;
use crate::model::PackageInfo;

/// Marks the output as machine-generated (matches Go's generated-file convention).
pub const BANNER: &str = "// Code generated by enumgen. DO NOT EDIT.";

/// Wraps the accumulated render buffer into a complete file.
///
/// With a formatter the combined bytes are post-processed and any formatter
/// failure is returned; without one the raw bytes are returned unchanged.
pub fn assemble(
    buffer: &str,
    pkg: &PackageInfo,
    file_name: &str,
    formatter: Option<&dyn Formatter>,
) -> EnumgenResult<Vec<u8>> {
    let mut out = String::with_capacity(BANNER.len() + pkg.name.len() + buffer.len() + 16);
    out.push_str(BANNER);
    out.push_str("\n\n");
    out.push_str("package ");
    out.push_str(&pkg.name);
    out.push('\n');
    out.push_str(buffer);

    let bytes = match formatter {
        Some(formatter) => formatter.format(file_name, out.as_bytes())?,
        None => out.into_bytes(),
    };

    info!(
        package = %pkg.path,
        file = %file_name,
        bytes = bytes.len(),
        formatted = formatter.is_some(),
        "Assembled output"
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EnumgenError;
    use crate::format::GoFormatter;
    use pretty_assertions::assert_eq;

    struct Rejecting;

    impl Formatter for Rejecting {
        fn format(&self, _file_name: &str, _source: &[u8]) -> EnumgenResult<Vec<u8>> {
            Err(EnumgenError::format("rejected"))
        }
    }

    fn pkg() -> PackageInfo {
        PackageInfo::new("example.com/paint", "paint")
    }

    #[test]
    fn test_raw_output() {
        let out = assemble("\nfunc f() {}\n", &pkg(), "enum_gen.go", None).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "// Code generated by enumgen. DO NOT EDIT.\n\npackage paint\n\nfunc f() {}\n"
        );
    }

    #[test]
    fn test_empty_buffer() {
        let out = assemble("", &pkg(), "enum_gen.go", Some(&GoFormatter)).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "// Code generated by enumgen. DO NOT EDIT.\n\npackage paint\n"
        );
    }

    #[test]
    fn test_formatter_failure_produces_nothing() {
        let err = assemble("\nfunc f() {}\n", &pkg(), "enum_gen.go", Some(&Rejecting)).unwrap_err();
        assert!(matches!(err, EnumgenError::Format { .. }));
    }
}
