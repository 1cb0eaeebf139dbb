//! `docpilot classify`: offline version classification of file names.

use docpilot_core::version::VersionClassifier;

pub fn run(names: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let classifier = VersionClassifier::new();

    for name in names {
        let info = classifier.classify(name);
        let status = match (&info.version, &info.version_type) {
            (Some(version), Some(kind)) if info.is_released => {
                format!("released {}{version}", kind.as_str())
            }
            (Some(version), Some(kind)) => format!("draft {}{version}", kind.as_str()),
            (Some(version), None) => format!("versioned {version}"),
            (None, _) => "unversioned".to_string(),
        };
        println!("{name}\t{status}\tbase={}", classifier.base_name(name));
    }

    if names.len() > 1 {
        println!();
        println!("Latest:");
        for name in classifier.select_latest_versions(names) {
            println!("  {name}");
        }
    }

    Ok(())
}
