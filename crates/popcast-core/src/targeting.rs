//! Targeting resolver: is an entry addressed to this agent?

use crate::types::{AgentId, Targets};

/// True when `targets` holds the `ALL` sentinel or the agent's normalized id.
pub fn matches(targets: &Targets, agent: &AgentId) -> bool {
    match targets {
        Targets::All => true,
        Targets::Agents(set) => set.contains(agent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(raw: &str) -> AgentId {
        AgentId::parse(raw).expect("valid id")
    }

    #[test]
    fn all_matches_everyone() {
        assert!(matches(&Targets::All, &id("S1")));
        assert!(matches(&Targets::All, &id("STATION-9")));
    }

    #[test]
    fn explicit_target_matches_only_listed() {
        let targets = Targets::agents(["S1"]);
        assert!(matches(&targets, &id("S1")));
        assert!(!matches(&targets, &id("S2")));
    }

    #[test]
    fn match_is_case_normalized() {
        let targets = Targets::agents(["station-1"]);
        assert!(matches(&targets, &id("STATION-1")));
        assert!(matches(&targets, &id("Station-1")));
    }

    #[test]
    fn punctuation_distinguishes_agents() {
        for (target, agent, want) in [
            ("S_1", "S.1", false),
            ("S_1", "S 1", false),
            ("S_1", "S/1", false),
            ("S_1", "s_1", true),
            ("Lobby 2", "LOBBY 2", true),
            ("Lobby 2", "LOBBY-2", false),
        ] {
            assert_eq!(
                matches(&Targets::agents([target]), &id(agent)),
                want,
                "{target} vs {agent}"
            );
        }
    }

    #[test]
    fn lowercase_all_addresses_nobody() {
        assert!(!matches(&Targets::agents(["all"]), &id("S1")));
    }

    #[test]
    fn empty_targets_match_nobody() {
        assert!(!matches(&Targets::default(), &id("S1")));
    }

    proptest! {
        #[test]
        fn listed_agent_always_matches(raw in "S[a-zA-Z0-9_.]{0,11}") {
            let agent = id(&raw);
            let targets = Targets::agents([raw.to_lowercase(), "OTHER-1".to_string()]);
            prop_assert!(matches(&targets, &agent));
        }

        #[test]
        fn normalization_is_idempotent(raw in "[ -~]{1,24}") {
            if let Ok(first) = AgentId::parse(&raw) {
                let again = AgentId::parse(first.as_str()).expect("normalized id re-parses");
                prop_assert_eq!(first, again);
            }
        }
    }
}
