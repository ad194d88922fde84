//! `popcast send`: append one entry to the broadcast log.

use chrono::Utc;

use popcast_core::{Entry, EntryId, Targets};
use popcast_log::{AnyLog, BroadcastLog, LogLocation};

use crate::cli::SendOpts;

pub async fn cmd_send(opts: SendOpts) -> anyhow::Result<()> {
    let entry = build_entry(&opts)?;
    let location: LogLocation = opts.log_url.parse()?;
    let log = AnyLog::open(&location, opts.credential.as_deref())?;

    let stored = log.append(entry).await?;
    tracing::info!(
        entry = %stored.id,
        entry_type = %stored.entry_type,
        "appended to {} log",
        log.kind()
    );
    println!("{}", stored.id);
    Ok(())
}

/// Build the entry as the authority writes it. The backend assigns `id`.
pub(crate) fn build_entry(opts: &SendOpts) -> anyhow::Result<Entry> {
    let targets = Targets::agents(opts.targets.split(','));
    if targets == Targets::default() {
        anyhow::bail!("no valid targets in {:?}", opts.targets);
    }

    Ok(Entry {
        id: EntryId::default(),
        entry_type: opts.entry_type,
        company_name: opts.company.clone(),
        title: opts.title.clone(),
        message: opts.message.clone(),
        logo: opts.logo.clone().unwrap_or_default(),
        targets,
        duration: opts.duration,
        created_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use popcast_core::{AgentId, EntryType};
    use popcast_log::FileLog;

    fn opts(log_url: &str, targets: &str) -> SendOpts {
        SendOpts {
            log_url: log_url.to_string(),
            credential: None,
            entry_type: EntryType::Persistent,
            targets: targets.to_string(),
            title: "Fire drill".into(),
            message: "Leave by the east stairs".into(),
            company: "Facilities".into(),
            logo: Some("https://cdn.example/fd.png".into()),
            duration: 0,
        }
    }

    #[test]
    fn targets_are_normalized() {
        let entry = build_entry(&opts("x", "station-1, Station-2")).expect("entry");
        let Targets::Agents(set) = &entry.targets else {
            panic!("expected explicit targets");
        };
        assert!(set.contains(&AgentId::parse("STATION-1").expect("id")));
        assert!(set.contains(&AgentId::parse("STATION-2").expect("id")));
        assert!(entry.id.is_empty());
    }

    #[test]
    fn all_wins_over_listed_agents() {
        let entry = build_entry(&opts("x", "STATION-1, ALL")).expect("entry");
        assert_eq!(entry.targets, Targets::All);
    }

    #[test]
    fn lowercase_all_is_not_a_broadcast() {
        assert!(build_entry(&opts("x", "all")).is_err());
    }

    #[test]
    fn empty_targets_are_rejected() {
        assert!(build_entry(&opts("x", " , ")).is_err());
    }

    #[tokio::test]
    async fn send_appends_to_file_log() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("log.jsonl");
        cmd_send(opts(path.to_str().expect("utf8"), "ALL"))
            .await
            .expect("send");

        let latest = FileLog::new(&path)
            .fetch_latest()
            .await
            .expect("fetch")
            .expect("entry");
        assert!(!latest.id.is_empty());
        assert_eq!(latest.entry_type, EntryType::Persistent);
        assert_eq!(latest.title, "Fire drill");
        assert_eq!(latest.targets, Targets::All);
    }
}
