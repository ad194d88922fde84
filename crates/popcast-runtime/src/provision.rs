//! Station identity: roster claim or generated fallback, persisted as TOML.

use std::path::{Path, PathBuf};

use anyhow::Context;
use popcast_core::roster::{GENERATED_SUFFIX_RANGE, generated_identity};
use popcast_core::{Identity, Roster};
use rand::RngExt;

use crate::cli::ProvisionOpts;

/// `<config dir>/popcast/identity.toml`.
pub fn default_identity_path() -> anyhow::Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join("popcast").join("identity.toml"))
        .context("no user config directory; pass --identity-file")
}

fn identity_path(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(p) => Ok(p.to_path_buf()),
        None => default_identity_path(),
    }
}

pub fn load(path: &Path) -> anyhow::Result<Option<Identity>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };
    let identity: Identity =
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(identity))
}

pub fn save(path: &Path, identity: &Identity) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let content = toml::to_string_pretty(identity)?;
    std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;

    // The file may hold a credential.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

/// `STATION-<OS>-<0..9999>`.
pub fn generate() -> anyhow::Result<Identity> {
    let mut rng = rand::rng();
    let suffix = rng.random_range(0..GENERATED_SUFFIX_RANGE);
    Ok(generated_identity(std::env::consts::OS, suffix)?)
}

/// Identity for the agent: the stored one, or a freshly generated one that
/// is saved for the next start.
pub fn resolve_identity(explicit: Option<&Path>) -> anyhow::Result<Identity> {
    let path = identity_path(explicit)?;
    if let Some(identity) = load(&path)? {
        tracing::info!("using identity {} from {}", identity.id, path.display());
        return Ok(identity);
    }
    let identity = generate()?;
    save(&path, &identity)?;
    tracing::info!("generated identity {} at {}", identity.id, path.display());
    Ok(identity)
}

/// `popcast provision`.
pub fn cmd_provision(opts: &ProvisionOpts) -> anyhow::Result<()> {
    let path = identity_path(opts.identity_file.as_deref())?;

    if opts.reset {
        match std::fs::remove_file(&path) {
            Ok(()) => println!("removed {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                println!("no identity at {}", path.display());
            }
            Err(e) => return Err(e).with_context(|| format!("removing {}", path.display())),
        }
        return Ok(());
    }

    let mut identity = match (&opts.station, opts.generate) {
        (Some(name), _) => Roster::default().select(name)?,
        (None, true) => generate()?,
        (None, false) => {
            match load(&path)? {
                Some(existing) => print_identity(&existing, &path),
                None => {
                    println!("no identity at {}", path.display());
                    println!("stations: {}", Roster::default().names().join(", "));
                }
            }
            return Ok(());
        }
    };
    identity.credential = opts.credential.clone();
    save(&path, &identity)?;
    print_identity(&identity, &path);
    Ok(())
}

fn print_identity(identity: &Identity, path: &Path) {
    println!("{} ({}) at {}", identity.id, identity.display_name, path.display());
}
