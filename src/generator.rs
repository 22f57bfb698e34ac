//! Fake people for the directory.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::editor::ValidRecord;
use crate::record::{ImageRef, PersonRecord, RecordId, Research, Role, Status, Team};

const FIRST_NAMES: &[&str] = &[
    "Jane", "John", "Olivia", "Phoenix", "Lana", "Demi", "Candice", "Natali", "Drew", "Orlando",
    "Andi", "Kate", "Mary", "Noah", "Liam", "Emma", "Ava", "Lucas", "Mia", "Ethan", "Zahir",
    "Amelie", "Koray", "Ines", "Jonas", "Freya", "Marco", "Yuki",
];

const LAST_NAMES: &[&str] = &[
    "Doe", "Rhye", "Baker", "Steiner", "Wilkinson", "Craig", "Cooper", "Diggs", "Lane", "Mitchell",
    "Janeway", "Watson", "Nguyen", "Okafor", "Schmidt", "Rossi", "Tanaka", "Silva", "Haddad",
    "Kowalski", "Moreau", "Larsen",
];

const COUNTRIES: &[&str] = &[
    "Austria", "Brazil", "Canada", "Denmark", "Egypt", "Finland", "Ghana", "India", "Japan",
    "Kenya", "Mexico", "Norway", "Portugal", "Spain", "Turkey", "Vietnam",
];

const GENDERS: &[&str] = &["Male", "Female", "Other"];

const COMPANY_WORDS: &[&str] = &[
    "Acme", "Globex", "Initech", "Umbrella", "Stark", "Wayne", "Hooli", "Vandelay", "Soylent",
    "Cyberdyne",
];

const COMPANY_SUFFIXES: &[&str] = &["Group", "LLC", "Inc", "and Sons", "Press", "Labs"];

const LOREM: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "labore", "dolore", "magna", "aliqua", "enim", "minim",
    "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi", "aliquip",
];

pub struct Generator {
    rng: StdRng,
}

impl Generator {
    /// A seeded generator is fully deterministic; without a seed it draws from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    pub fn people(&mut self, count: usize) -> Vec<PersonRecord> {
        (0..count).map(|_| self.person()).collect()
    }

    pub fn person(&mut self) -> PersonRecord {
        let first = self.pick(FIRST_NAMES);
        let last = self.pick(LAST_NAMES);
        let role = *Role::ALL.choose(&mut self.rng).unwrap_or(&Role::ProductDesigner);
        let team = *Team::ALL.choose(&mut self.rng).unwrap_or(&Team::Design);
        let valid = ValidRecord {
            name: format!("{first} {last}"),
            email: format!("{}@untitledui.com", first.to_lowercase()),
            role,
            status: Status::Active,
            teams: vec![team],
            profile_image: self.avatar(),
        };
        self.enrich(valid)
    }

    /// Completes an editor-validated record with the generator-owned display fields.
    pub fn enrich(&mut self, valid: ValidRecord) -> PersonRecord {
        PersonRecord {
            id: RecordId::default(),
            name: valid.name,
            email: valid.email,
            role: valid.role,
            status: valid.status,
            teams: valid.teams,
            profile_image: valid.profile_image,
            date_of_birth: self.date_of_birth(),
            gender: self.pick(GENDERS).to_string(),
            nationality: self.pick(COUNTRIES).to_string(),
            contact_no: self.contact_no(),
            research: self.research(),
        }
    }

    fn pick(&mut self, words: &[&'static str]) -> &'static str {
        words.choose(&mut self.rng).copied().unwrap_or_default()
    }

    fn avatar(&mut self) -> ImageRef {
        ImageRef::new(format!(
            "https://avatars.githubusercontent.com/u/{}",
            self.rng.random_range(1..90_000_000)
        ))
    }

    fn date_of_birth(&mut self) -> String {
        let month = self.rng.random_range(1..=12);
        let day = self.rng.random_range(1..=28);
        let year = self.rng.random_range(1995..=2025);
        format!("{month}/{day}/{year}")
    }

    fn contact_no(&mut self) -> String {
        format!(
            "({:03}) {:03}-{:04}",
            self.rng.random_range(200..1000),
            self.rng.random_range(0..1000),
            self.rng.random_range(0..10000)
        )
    }

    fn words(&mut self, count: usize) -> String {
        (0..count)
            .map(|_| self.pick(LOREM))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn research(&mut self) -> Research {
        let abstract_text = (0..3)
            .map(|_| {
                let n = self.rng.random_range(6..12);
                let sentence = self.words(n);
                let mut chars = sentence.chars();
                match chars.next() {
                    Some(c) => format!("{}{}.", c.to_uppercase(), chars.as_str()),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        Research {
            title: self.words(5),
            publication_name: format!(
                "{} {}",
                self.pick(COMPANY_WORDS),
                self.pick(COMPANY_SUFFIXES)
            ),
            publication_year: self.rng.random_range(2021..=2025),
            abstract_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::validate_record;

    #[test]
    fn seeded_generators_agree() {
        let a = Generator::new(Some(3)).people(20);
        let b = Generator::new(Some(3)).people(20);
        assert_eq!(a, b);
    }

    #[test]
    fn generated_people_satisfy_the_schema() {
        for person in Generator::new(Some(11)).people(100) {
            assert!(validate_record(&person).is_ok(), "{person:?}");
            let first = person.name.split(' ').next().unwrap().to_lowercase();
            assert_eq!(person.email, format!("{first}@untitledui.com"));
            assert!(!person.research.abstract_text.is_empty());
        }
    }

    #[test]
    fn enrich_keeps_editor_fields() {
        let valid = ValidRecord {
            name: "Jane Doe".into(),
            email: "jane@x.com".into(),
            role: Role::UxCopywriter,
            status: Status::Inactive,
            teams: vec![Team::Marketing],
            profile_image: ImageRef::placeholder(),
        };
        let person = Generator::new(Some(1)).enrich(valid);
        assert_eq!(person.name, "Jane Doe");
        assert_eq!(person.status, Status::Inactive);
        assert!(!person.nationality.is_empty());
        assert!(!person.contact_no.is_empty());
    }
}
