//! Person records and the label vocabularies they are built from.

use std::fmt;
use std::str::FromStr;

use crate::domain::DirError;

pub const PLACEHOLDER_IMAGE: &str = "/default-avatar.png";

/// Declares a closed set of display labels with parsing and printing.
macro_rules! label_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            pub const LABELS: &'static [&'static str] = &[$($label),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = DirError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($label => Ok($name::$variant),)+
                    other => Err(DirError::UnknownLabel {
                        kind: $kind,
                        label: other.to_string(),
                    }),
                }
            }
        }
    };
}

label_enum!(Role, "role", {
    ProductDesigner => "Product Designer",
    ProductManager => "Product Manager",
    FrontendDeveloper => "Frontend Developer",
    BackendDeveloper => "Backend Developer",
    UxDesigner => "UX Designer",
    UxCopywriter => "UX Copywriter",
    QaEngineer => "QA Engineer",
});

label_enum!(Team, "team", {
    Design => "Design",
    Product => "Product",
    Marketing => "Marketing",
    Technology => "Technology",
});

label_enum!(Status, "status", {
    Active => "Active",
    Inactive => "Inactive",
});

/// Synthetic identifier handed out by the store. Never changes for a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Reference to a profile image: a URI or an embedded `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn placeholder() -> Self {
        Self(PLACEHOLDER_IMAGE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_placeholder(&self) -> bool {
        self.0 == PLACEHOLDER_IMAGE
    }

    pub fn is_embedded(&self) -> bool {
        self.0.starts_with("data:")
    }

    /// Short text used wherever the image itself cannot be drawn.
    pub fn describe(&self) -> String {
        if self.is_placeholder() {
            "no photo".to_string()
        } else if self.is_embedded() {
            let mime = self
                .0
                .trim_start_matches("data:")
                .split(';')
                .next()
                .unwrap_or("image");
            let kib = self.0.len() * 3 / 4 / 1024;
            format!("{mime}, ~{kib} KiB")
        } else {
            self.0.clone()
        }
    }
}

impl Default for ImageRef {
    fn default() -> Self {
        Self::placeholder()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Research {
    pub title: String,
    pub publication_name: String,
    pub publication_year: u16,
    pub abstract_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRecord {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: Status,
    pub teams: Vec<Team>,
    pub profile_image: ImageRef,
    pub date_of_birth: String,
    pub gender: String,
    pub nationality: String,
    pub contact_no: String,
    pub research: Research,
}

impl PersonRecord {
    /// `@` handle shown in the profile panel.
    pub fn handle(&self) -> String {
        format!("@{}", self.name.to_lowercase().replacen(' ', "", 1))
    }

    pub fn teams_label(&self) -> String {
        self.teams
            .iter()
            .map(|t| t.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Shallow patch: every `Some` field overwrites, `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub status: Option<Status>,
    pub teams: Option<Vec<Team>>,
    pub profile_image: Option<ImageRef>,
}

impl RecordPatch {
    pub fn apply(&self, record: &mut PersonRecord) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        if let Some(email) = &self.email {
            record.email = email.clone();
        }
        if let Some(role) = self.role {
            record.role = role;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(teams) = &self.teams {
            record.teams = teams.clone();
        }
        if let Some(image) = &self.profile_image {
            record.profile_image = image.clone();
        }
    }
}

#[cfg(test)]
pub(crate) fn sample(name: &str, email: &str, role: Role, teams: &[Team]) -> PersonRecord {
    PersonRecord {
        id: RecordId::default(),
        name: name.to_string(),
        email: email.to_string(),
        role,
        status: Status::Active,
        teams: teams.to_vec(),
        profile_image: ImageRef::placeholder(),
        date_of_birth: "1/2/1990".to_string(),
        gender: "Other".to_string(),
        nationality: "Austria".to_string(),
        contact_no: "(555) 010-0000".to_string(),
        research: Research::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_from_str() {
        for role in Role::ALL {
            assert_eq!(role.label().parse::<Role>().unwrap(), *role);
        }
        assert_eq!(" Marketing ".parse::<Team>().unwrap(), Team::Marketing);
    }

    #[test]
    fn unknown_label_names_its_kind() {
        match "Pending".parse::<Status>() {
            Err(DirError::UnknownLabel { kind, label }) => {
                assert_eq!(kind, "status");
                assert_eq!(label, "Pending");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn handle_drops_only_the_first_space() {
        let r = sample("Mary Jane Watson", "mary@untitledui.com", Role::UxDesigner, &[]);
        assert_eq!(r.handle(), "@maryjane watson");
    }

    #[test]
    fn patch_overwrites_only_given_fields() {
        let mut r = sample("Ann Lee", "ann@x.com", Role::QaEngineer, &[Team::Design]);
        let patch = RecordPatch {
            role: Some(Role::ProductManager),
            teams: Some(vec![Team::Product, Team::Technology]),
            ..Default::default()
        };
        patch.apply(&mut r);
        assert_eq!(r.role, Role::ProductManager);
        assert_eq!(r.teams_label(), "Product, Technology");
        assert_eq!(r.name, "Ann Lee");
        assert_eq!(r.email, "ann@x.com");
    }

    #[test]
    fn image_descriptions() {
        assert_eq!(ImageRef::placeholder().describe(), "no photo");
        assert!(ImageRef::new("data:image/png;base64,AAAA").describe().starts_with("image/png"));
        assert_eq!(ImageRef::new("https://a/b.png").describe(), "https://a/b.png");
    }
}
