use serde::{Deserialize, Serialize};

/// Position in the three-step wizard. Ordered: `Details < Content < Review`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    Details,
    Content,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 3] = [WizardStep::Details, WizardStep::Content, WizardStep::Review];

    /// 1-based position, as shown in the step badges.
    pub fn number(self) -> u8 {
        match self {
            WizardStep::Details => 1,
            WizardStep::Content => 2,
            WizardStep::Review => 3,
        }
    }

    pub fn next(self) -> Option<WizardStep> {
        match self {
            WizardStep::Details => Some(WizardStep::Content),
            WizardStep::Content => Some(WizardStep::Review),
            WizardStep::Review => None,
        }
    }

    pub fn prev(self) -> Option<WizardStep> {
        match self {
            WizardStep::Details => None,
            WizardStep::Content => Some(WizardStep::Details),
            WizardStep::Review => Some(WizardStep::Content),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::Details => "Campaign Details",
            WizardStep::Content => "Email Content",
            WizardStep::Review => "Review & Create",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            WizardStep::Details => "Enter campaign details and select template and segment.",
            WizardStep::Content => "Customize your email content using MJML.",
            WizardStep::Review => "Review your campaign settings before creating.",
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WizardStep::Details => "details",
            WizardStep::Content => "content",
            WizardStep::Review => "review",
        };
        f.write_str(s)
    }
}
