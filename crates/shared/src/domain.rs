use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::UnknownVariant;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(DepartmentId);
id_newtype!(AcademicYearId);
id_newtype!(YearSessionId);
id_newtype!(TopicId);
id_newtype!(ApprovedTopicId);
id_newtype!(DocumentId);
id_newtype!(AnnouncementId);

/// Wire names are matched case-insensitively; `-` and spaces count as `_`.
macro_rules! wire_names {
    ($name:ident { $($variant:ident => $wire:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let normalized = raw.trim().to_ascii_uppercase().replace(['-', ' '], "_");
                match normalized.as_str() {
                    $($wire $(| $alias)* => Ok($name::$variant),)+
                    _ => Err(UnknownVariant::new(stringify!($name), raw)),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[serde(alias = "ROLE_ADMIN")]
    Admin,
    #[serde(alias = "ROLE_ASSISTANT")]
    Assistant,
    #[serde(alias = "ROLE_TEACHER")]
    Teacher,
    #[serde(alias = "ROLE_STUDENT")]
    Student,
}

wire_names!(Role {
    Admin => "ADMIN" | "ROLE_ADMIN",
    Assistant => "ASSISTANT" | "ROLE_ASSISTANT",
    Teacher => "TEACHER" | "ROLE_TEACHER",
    Student => "STUDENT" | "ROLE_STUDENT",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcademicYearStatus {
    Start,
    End,
}

wire_names!(AcademicYearStatus {
    Start => "START",
    End => "END",
});

/// Per-department workflow phase inside an academic year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    OnRegistration,
    UnderReview,
    InProgress,
    Completed,
}

wire_names!(SessionStatus {
    OnRegistration => "ON_REGISTRATION",
    UnderReview => "UNDER_REVIEW",
    InProgress => "IN_PROGRESS",
    Completed => "COMPLETED",
});

/// Review status of a topic registration. Some backend rows carry a
/// cancelled marker; it is kept so those rows still decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TopicStatus {
    Pending,
    NeedsUpdate,
    Rejected,
    Approved,
    #[serde(alias = "CANCELLED")]
    Canceled,
}

wire_names!(TopicStatus {
    Pending => "PENDING",
    NeedsUpdate => "NEEDS_UPDATE",
    Rejected => "REJECTED",
    Approved => "APPROVED",
    Canceled => "CANCELED" | "CANCELLED",
});

impl TopicStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TopicStatus::Approved | TopicStatus::Rejected | TopicStatus::Canceled
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovedTopicStatus {
    InProgress,
    Completed,
    NotCompleted,
    #[serde(alias = "CANCELLED")]
    Canceled,
}

wire_names!(ApprovedTopicStatus {
    InProgress => "IN_PROGRESS",
    Completed => "COMPLETED",
    NotCompleted => "NOT_COMPLETED",
    Canceled => "CANCELED" | "CANCELLED",
});

impl ApprovedTopicStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ApprovedTopicStatus::InProgress)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    MidtermReport,
    SummaryReport,
    ScientificArticle,
    ScientificPresentation,
}

wire_names!(DocumentType {
    MidtermReport => "MIDTERM_REPORT",
    SummaryReport => "SUMMARY_REPORT",
    ScientificArticle => "SCIENTIFIC_ARTICLE",
    ScientificPresentation => "SCIENTIFIC_PRESENTATION",
});

impl DocumentType {
    pub fn requires_summary(self) -> bool {
        matches!(self, DocumentType::ScientificArticle)
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
