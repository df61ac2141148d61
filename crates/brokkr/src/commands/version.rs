//! Version command

use crate::cli::VersionArgs;
use crate::output;
use crate::version::VersionInfo;
use anyhow::Result;

pub fn run(args: VersionArgs) -> Result<()> {
    let info = VersionInfo::current();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", info.display());
    output::kv("Artifact", &info.artifact.archive);
    output::kv("Manifest", &info.artifact.manifest);
    output::kv("Default capability", &info.artifact.default_capability);
    output::kv("Entry point descriptor", &info.artifact.descriptor);

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::version::{ArtifactFormat, VersionInfo};

    fn info(commit: Option<&str>, target: Option<&str>) -> VersionInfo {
        VersionInfo {
            version: "1.2.3".to_string(),
            commit: commit.map(String::from),
            target: target.map(String::from),
            artifact: ArtifactFormat::current(),
        }
    }

    #[test]
    fn test_version_info_current_is_valid_semver() {
        let info = VersionInfo::current();
        assert!(
            semver::Version::parse(&info.version).is_ok(),
            "version should be valid semver, got: {}",
            info.version
        );
    }

    #[test]
    fn test_version_info_display_with_all_fields() {
        let info = info(Some("abc1234"), Some("x86_64-unknown-linux-gnu"));
        assert_eq!(
            info.to_string(),
            "brokkr 1.2.3 (abc1234) x86_64-unknown-linux-gnu"
        );
    }

    #[test]
    fn test_version_info_display_without_optional_fields() {
        assert_eq!(info(None, None).display(), "brokkr 1.2.3");
    }

    #[test]
    fn test_artifact_format_names_default_descriptor() {
        let format = ArtifactFormat::current();
        assert_eq!(format.manifest, "module.yml");
        assert_eq!(format.default_capability, "brokkr.ModuleEntryPoint");
        assert_eq!(
            format.descriptor,
            "META-INF/services/brokkr.ModuleEntryPoint"
        );
    }
}
