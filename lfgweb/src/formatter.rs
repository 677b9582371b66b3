use colored::*;
use lfg_service::{
    LfgError,
    pb::{
        self, GroupApplicationsUpdate, GroupsUpdate, KillProofId, group_applications_update,
        groups_update,
    },
};
use lfgweb_core::{CallError, ConfigError, client::ClientConnectError};
use std::fmt::Display;

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

pub struct GroupList(pub Vec<pb::Group>);

pub struct ApplicationList(pub Vec<pb::GroupApplication>);

pub struct GenericError<T: Display>(pub &'static str, pub T);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.0)
    }
}

fn kill_proof_name(id: i32) -> &'static str {
    KillProofId::try_from(id)
        .unwrap_or(KillProofId::Unknown)
        .as_str_name()
}

fn group_line(group: &pb::Group) -> String {
    let requirement = if group.kill_proof_minimum == 0 {
        "no requirement".dimmed().to_string()
    } else {
        format!(
            "{} x {}",
            group.kill_proof_minimum,
            kill_proof_name(group.kill_proof_id)
        )
    };

    format!(
        "{} {} ({}) by {}",
        group.id.cyan(),
        group.title.bold(),
        requirement,
        group.creator_id
    )
}

fn application_line(application: &pb::GroupApplication) -> String {
    let proofs: Vec<String> = application
        .kill_proofs
        .iter()
        .map(|kp| format!("{} x {}", kp.amount, kill_proof_name(kp.kill_proof_id)))
        .collect();

    format!(
        "{} {} [{}]",
        application.id.cyan(),
        application.account_name.bold(),
        proofs.join(", ")
    )
}

impl From<pb::Group> for FormattedString {
    fn from(group: pb::Group) -> Self {
        FormattedString(group_line(&group))
    }
}

impl From<pb::GroupApplication> for FormattedString {
    fn from(application: pb::GroupApplication) -> Self {
        FormattedString(application_line(&application))
    }
}

impl From<GroupList> for FormattedString {
    fn from(GroupList(groups): GroupList) -> Self {
        if groups.is_empty() {
            return FormattedString("No groups found.".yellow().to_string());
        }

        let mut out = String::from("Open Groups:\n");
        for group in &groups {
            out.push_str(&format!("  - {}\n", group_line(group)));
        }
        FormattedString(out.trim_end().to_string())
    }
}

impl From<ApplicationList> for FormattedString {
    fn from(ApplicationList(applications): ApplicationList) -> Self {
        if applications.is_empty() {
            return FormattedString("No applications found.".yellow().to_string());
        }

        let mut out = String::from("Applications:\n");
        for application in &applications {
            out.push_str(&format!("  - {}\n", application_line(application)));
        }
        FormattedString(out.trim_end().to_string())
    }
}

impl From<GroupsUpdate> for FormattedString {
    fn from(update: GroupsUpdate) -> Self {
        FormattedString(match update.update {
            Some(groups_update::Update::NewGroup(group)) => {
                format!("{} {}", "+".green().bold(), group_line(&group))
            }
            Some(groups_update::Update::UpdatedGroup(group)) => {
                format!("{} {}", "~".yellow().bold(), group_line(&group))
            }
            Some(groups_update::Update::RemovedGroupId(id)) => {
                format!("{} {}", "-".red().bold(), id.cyan())
            }
            None => "(empty update)".dimmed().to_string(),
        })
    }
}

impl From<GroupApplicationsUpdate> for FormattedString {
    fn from(update: GroupApplicationsUpdate) -> Self {
        FormattedString(match update.update {
            Some(group_applications_update::Update::NewApplication(application)) => {
                format!("{} {}", "+".green().bold(), application_line(&application))
            }
            Some(group_applications_update::Update::RemovedApplicationId(id)) => {
                format!("{} {}", "-".red().bold(), id.cyan())
            }
            None => "(empty update)".dimmed().to_string(),
        })
    }
}

impl From<LfgError> for FormattedString {
    fn from(err: LfgError) -> Self {
        match err {
            LfgError::Call(CallError::Unauthenticated { message }) => FormattedString(format!(
                "{}\n\n'{}'\n\nRefresh your token with `lfgweb config set-token <TOKEN>` or pass `--token`.",
                "Not Authenticated:".red().bold(),
                message
            )),
            LfgError::Call(CallError::Rpc { code, message }) => FormattedString(format!(
                "{} code={:?} message={:?}",
                "Call Failed:".red().bold(),
                code,
                message
            )),
            LfgError::Call(err) => {
                FormattedString(format!("{}\n\n'{}'", "Call Failed:".red().bold(), err))
            }
            LfgError::Decode(err) => FormattedString(format!(
                "{}\n\n'{}'",
                "Unexpected response:".red().bold(),
                err
            )),
        }
    }
}

impl From<ClientConnectError> for FormattedString {
    fn from(err: ClientConnectError) -> Self {
        FormattedString(format!("{}\n\n'{}'", "Connection Error:".red().bold(), err))
    }
}

impl From<ConfigError> for FormattedString {
    fn from(err: ConfigError) -> Self {
        FormattedString(format!(
            "{}\n\n'{}'",
            "Invalid configuration:".red().bold(),
            err
        ))
    }
}

impl<T: Display> From<GenericError<T>> for FormattedString {
    fn from(GenericError(msg, err): GenericError<T>) -> Self {
        FormattedString(format!("{}:\n\n'{}'", msg.red().bold(), err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_gets_a_hint() {
        let err = LfgError::Call(CallError::Unauthenticated {
            message: "expired".to_string(),
        });
        let FormattedString(text) = err.into();
        assert!(text.contains("set-token"));
        assert!(text.contains("expired"));
    }

    #[test]
    fn unknown_kill_proof_falls_back() {
        assert_eq!(kill_proof_name(42), "UNKNOWN");
        assert_eq!(kill_proof_name(KillProofId::Ufe as i32), "UFE");
    }

    #[test]
    fn empty_group_list() {
        let FormattedString(text) = GroupList(Vec::new()).into();
        assert!(text.contains("No groups found."));
    }
}
