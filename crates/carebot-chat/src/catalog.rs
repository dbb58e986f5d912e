//! Static knowledge base: branches, their departments and locations, and
//! emergency contacts.

/// A hospital branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    /// Free-text location, phrased to follow "is located".
    pub location: String,
    pub departments: Vec<String>,
}

impl Branch {
    pub fn new(name: &str, location: &str, departments: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            location: location.to_string(),
            departments: departments.iter().map(|d| d.to_string()).collect(),
        }
    }

    /// Lowercased first word of the name, used in `services.<slug>` intents.
    pub fn slug(&self) -> String {
        self.name
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }
}

/// Process-wide, read-only branch catalog.
#[derive(Debug, Clone)]
pub struct BranchCatalog {
    branches: Vec<Branch>,
    contacts: Vec<String>,
}

const RWANDA_DEPARTMENTS: &[&str] = &[
    "Internal Medicine",
    "Obstetrics and Gynecology",
    "Pediatrics",
    "Pulmonology",
    "Gastroenterology",
    "Nephrology",
    "Endocrinology",
    "Neurology",
    "Oncology",
    "Cardiology",
    "Rheumatology",
    "ENT",
    "Hematology",
    "Psychiatry",
    "Dermatology",
    "Dialysis",
    "Endoscopy",
    "Spirometry",
    "Adult ICU",
    "Out Patient Department",
    "Emergency Services",
    "Imaging Services",
    "Laboratory Services",
    "NICU",
    "Advanced Life Support Ambulance Services",
    "Travel Medicine",
];

const BULBULA_DEPARTMENTS: &[&str] = &[
    "General Surgery",
    "Orthopedic Surgery",
    "Laparoscopic Surgery",
    "Endocrine Surgery",
    "Plastic Surgery",
    "Vascular Surgery",
    "ENT Surgery",
    "Neurosurgery",
    "Hip and Knee Replacement Surgery",
    "Uro-surgery",
    "Hepatobiliary surgery",
    "Colorectal Surgery",
    "Pediatrics Surgery",
    "Internal Medicine",
    "Obstetrics and Gynecology",
    "Pediatrics",
    "Out Patient Department",
    "Emergency Services",
    "Adult ICU",
    "Laboratory Services",
    "Advanced Life Support Ambulance Services",
];

const EMERGENCY_CONTACTS: &[&str] = &["6511", "+251-939515151", "+251-939525252"];

impl Default for BranchCatalog {
    fn default() -> Self {
        Self::new(
            vec![
                Branch::new(
                    "Rwanda Branch",
                    "in front of Rwanda Embassy",
                    RWANDA_DEPARTMENTS,
                ),
                Branch::new(
                    "Bulbula Branch",
                    "Bole Bulbula, around Mariam Mazoriya",
                    BULBULA_DEPARTMENTS,
                ),
            ],
            EMERGENCY_CONTACTS.iter().map(|c| c.to_string()).collect(),
        )
    }
}

impl BranchCatalog {
    pub fn new(branches: Vec<Branch>, contacts: Vec<String>) -> Self {
        Self { branches, contacts }
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    /// Branch names in catalog order.
    pub fn branch_names(&self) -> Vec<String> {
        self.branches.iter().map(|b| b.name.clone()).collect()
    }

    /// Case-insensitive exact match on branch name.
    pub fn normalize(&self, name: &str) -> Option<&Branch> {
        let wanted = name.trim().to_lowercase();
        self.branches
            .iter()
            .find(|b| b.name.to_lowercase() == wanted)
    }

    pub fn by_slug(&self, slug: &str) -> Option<&Branch> {
        self.branches.iter().find(|b| b.slug() == slug)
    }

    pub fn contacts(&self) -> &[String] {
        &self.contacts
    }

    /// `"Call: a, b, c"`.
    pub fn emergency_line(&self) -> String {
        format!("Call: {}", self.contacts.join(", "))
    }
}
