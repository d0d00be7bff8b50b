use crate::domain::errors::ActionError;

pub struct PackageValidator;

impl PackageValidator {
    /// Ids are passed to the tool as a single argument, so anything that could be
    /// read as a flag or split by the tool's own tokenizer is rejected.
    pub fn validate_package_id(id: &str) -> bool {
        !id.is_empty()
            && !id.starts_with('-')
            && id
                .chars()
                .all(|c| !c.is_whitespace() && !c.is_control() && c != '"' && c != '\'')
    }

    pub fn validate(id: &str) -> Result<(), ActionError> {
        if !Self::validate_package_id(id) {
            return Err(ActionError::InvalidPackageId(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_real_world_ids() {
        for id in [
            "Google.Chrome",
            "7zip.7zip",
            "Notepad++.Notepad++",
            "Microsoft.VCRedist.2015+.x64",
            "9NBLGGH4NNS1",
        ] {
            assert!(PackageValidator::validate_package_id(id), "{id}");
        }
    }

    #[test]
    fn test_rejects_flags_and_whitespace() {
        for id in ["", "--silent", "Google Chrome", "Foo.Bar\n", "\"Foo.Bar\""] {
            assert!(!PackageValidator::validate_package_id(id), "{id:?}");
        }
        assert_eq!(
            PackageValidator::validate("-x"),
            Err(ActionError::InvalidPackageId("-x".to_string()))
        );
    }
}
