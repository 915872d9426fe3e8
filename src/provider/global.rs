use crate::config::ConfigurationSet;

use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstallError {
    #[error("configuration already installed")]
    AlreadyInstalled,
}

static INSTANCE: OnceLock<ConfigurationSet> = OnceLock::new();

/// Make `set` the process-wide configuration. Only the first call succeeds;
/// the installed set lives until the process exits.
pub fn install(set: ConfigurationSet) -> Result<&'static ConfigurationSet, InstallError> {
    let mut installed_now = false;
    let installed = INSTANCE.get_or_init(|| {
        installed_now = true;
        set
    });
    if installed_now {
        Ok(installed)
    } else {
        Err(InstallError::AlreadyInstalled)
    }
}

/// The process-wide configuration, once installed.
pub fn current() -> Option<&'static ConfigurationSet> {
    INSTANCE.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLayer;
    use crate::provider::resolve;

    // The only test in the crate that touches the process-wide instance.
    #[test]
    fn test_install_once() {
        let set = resolve(&ConfigLayer::example(), &ConfigLayer::default()).expect("resolve");
        let installed = install(set.clone()).expect("first install");
        assert_eq!(installed, &set);
        assert!(std::ptr::eq(installed, current().expect("installed")));
        assert_eq!(install(set), Err(InstallError::AlreadyInstalled));
    }
}
