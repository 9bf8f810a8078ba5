/// The seven predefined log formats, selectable by name (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredefinedFormat {
    Combined,
    VCombined,
    Common,
    VCommon,
    W3c,
    CloudFront,
    CloudStorage,
}

/// The bit-exact template string for one predefined format (spec §6).
#[must_use]
pub fn predefined_format(fmt: PredefinedFormat) -> &'static str {
    match fmt {
        PredefinedFormat::Combined => r#"%h %^[%d:%t %^] "%r" %s %b "%R" "%u""#,
        PredefinedFormat::VCombined => r#"%^:%^ %h %^[%d:%t %^] "%r" %s %b "%R" "%u""#,
        PredefinedFormat::Common => r#"%h %^[%d:%t %^] "%r" %s %b"#,
        PredefinedFormat::VCommon => r#"%^:%^ %h %^[%d:%t %^] "%r" %s %b"#,
        PredefinedFormat::W3c => "%d %t %h %^ %^ %^ %m %r %^ %s %b %^ %^ %u %R",
        PredefinedFormat::CloudFront => "%d\t%t\t%^\t%b\t%h\t%m\t%^\t%r\t%s\t%R\t%u\t%^",
        PredefinedFormat::CloudStorage => {
            r#""%x","%h",%^,%^,"%m","%U","%s",%^,"%b","%D",%^,"%R","%u""#
        }
    }
}

impl std::str::FromStr for PredefinedFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "COMBINED" => PredefinedFormat::Combined,
            "VCOMBINED" => PredefinedFormat::VCombined,
            "COMMON" => PredefinedFormat::Common,
            "VCOMMON" => PredefinedFormat::VCommon,
            "W3C" => PredefinedFormat::W3c,
            "CLOUDFRONT" => PredefinedFormat::CloudFront,
            "CLOUDSTORAGE" => PredefinedFormat::CloudStorage,
            _ => return Err(()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_template_matches_spec() {
        assert_eq!(
            predefined_format(PredefinedFormat::Combined),
            r#"%h %^[%d:%t %^] "%r" %s %b "%R" "%u""#
        );
    }

    #[test]
    fn names_round_trip() {
        use std::str::FromStr;
        assert_eq!(PredefinedFormat::from_str("W3C").unwrap(), PredefinedFormat::W3c);
        assert!(PredefinedFormat::from_str("NOPE").is_err());
    }
}
