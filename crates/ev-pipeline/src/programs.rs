//! Compliance program catalog: named starter checklists.
//!
//! The built-in catalog covers common healthcare and privacy programs. A
//! TOML file can add programs or replace built-in ones:
//!
//! ```toml
//! [[program]]
//! name = "Internal Security Baseline (ISB)"
//! description = "Company security controls"
//! checklist = """
//! 1. Laptops use full-disk encryption.
//! 2. Production access requires MFA.
//! """
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// One compliance program and its checklist template text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceProgram {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub checklist: String,
}

impl ComplianceProgram {
    /// The parenthesised short code in the name, e.g. `GDPR`.
    #[must_use]
    pub fn short_code(&self) -> Option<&str> {
        let open = self.name.find('(')?;
        let close = self.name[open..].find(')')? + open;
        let code = self.name[open + 1..close].trim();
        (!code.is_empty()).then_some(code)
    }

    fn matches(&self, query: &str) -> bool {
        self.name.eq_ignore_ascii_case(query)
            || self
                .short_code()
                .is_some_and(|code| code.eq_ignore_ascii_case(query))
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    program: Vec<ComplianceProgram>,
}

/// Ordered set of compliance programs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramCatalog {
    programs: Vec<ComplianceProgram>,
}

impl Default for ProgramCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProgramCatalog {
    /// The built-in programs.
    #[must_use]
    pub fn builtin() -> Self {
        let programs = BUILTIN
            .iter()
            .map(|(name, description, items)| ComplianceProgram {
                name: (*name).to_string(),
                description: (*description).to_string(),
                checklist: numbered(items),
            })
            .collect();
        Self { programs }
    }

    /// Parse programs from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Catalog`] if the text is not a valid catalog
    /// or a program has an empty name or checklist.
    pub fn from_toml_str(raw: &str, origin: &Path) -> Result<Self, PipelineError> {
        let invalid = |reason: String| PipelineError::Catalog {
            path: origin.to_path_buf(),
            reason,
        };
        let file: CatalogFile = toml::from_str(raw).map_err(|e| invalid(e.to_string()))?;
        for program in &file.program {
            if program.name.trim().is_empty() {
                return Err(invalid("program with empty name".into()));
            }
            if program.checklist.trim().is_empty() {
                return Err(invalid(format!("program '{}' has an empty checklist", program.name)));
            }
        }
        Ok(Self {
            programs: file.program,
        })
    }

    /// Built-in programs with the file at `path` layered on top.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Catalog`] if the file cannot be read or parsed.
    pub fn with_overrides(path: &Path) -> Result<Self, PipelineError> {
        let raw = std::fs::read_to_string(path).map_err(|e| PipelineError::Catalog {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut catalog = Self::builtin();
        catalog.merge(Self::from_toml_str(&raw, path)?);
        Ok(catalog)
    }

    /// Add `other`'s programs; a program with an existing name replaces it.
    pub fn merge(&mut self, other: Self) {
        for program in other.programs {
            match self
                .programs
                .iter_mut()
                .find(|p| p.name.eq_ignore_ascii_case(&program.name))
            {
                Some(existing) => *existing = program,
                None => self.programs.push(program),
            }
        }
    }

    /// Look up a program by full name or short code, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownProgram`].
    pub fn get(&self, name: &str) -> Result<&ComplianceProgram, PipelineError> {
        let query = name.trim();
        self.programs
            .iter()
            .find(|p| p.matches(query))
            .ok_or_else(|| PipelineError::UnknownProgram(name.to_string()))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ComplianceProgram> {
        self.programs.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

fn numbered(items: &[&str]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {item}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

type BuiltinProgram = (&'static str, &'static str, &'static [&'static str]);

const BUILTIN: &[BuiltinProgram] = &[
    (
        "Health Insurance Portability and Accountability Act (HIPAA)",
        "Privacy and security of protected health information",
        &[
            "A privacy officer and a security officer are designated.",
            "A documented risk analysis of electronic protected health information is performed at least annually.",
            "Access to protected health information is restricted to authorized personnel only.",
            "Business associate agreements are in place with every vendor that handles protected health information.",
            "Breaches of unsecured protected health information are reported to affected individuals within 60 days of discovery.",
        ],
    ),
    (
        "Federal Trade Commission (FTC) Regulations",
        "Consumer protection and health breach notification",
        &[
            "Privacy notices accurately describe how consumer data is collected, used, and shared.",
            "Consumer health data breaches are reported to the FTC and affected consumers as required by the Health Breach Notification Rule.",
            "Marketing claims about products and services are substantiated by evidence.",
        ],
    ),
    (
        "General Data Protection Regulation (GDPR)",
        "Processing of personal data of individuals in the EU",
        &[
            "A lawful basis is documented for every personal data processing activity.",
            "Clear procedures are in place to detect, report, and investigate personal data breaches within 72 hours.",
            "Data subject access requests are answered within one month.",
            "All employees have completed mandatory data privacy training within 30 days of hire.",
            "Data protection impact assessments are performed for high-risk processing.",
        ],
    ),
    (
        "Health Information Technology for Economic and Clinical Health Act (HITECH)",
        "Breach notification and meaningful use of health IT",
        &[
            "Breaches affecting 500 or more individuals are reported to the Secretary of HHS and prominent media outlets.",
            "Protected health information is encrypted at rest and in transit.",
            "Accountings of disclosures made through electronic health records are available to patients on request.",
        ],
    ),
    (
        "Food and Drug Administration (FDA) Regulations",
        "Safety and quality of drugs, devices, and electronic records",
        &[
            "Electronic records and signatures comply with 21 CFR Part 11 controls.",
            "Adverse events are reported to the FDA within the required timeframes.",
            "Quality system procedures for design controls and corrective actions are documented.",
        ],
    ),
    (
        "Clinical Laboratory Improvement Amendments (CLIA)",
        "Quality standards for laboratory testing",
        &[
            "The laboratory holds a current CLIA certificate appropriate to its test complexity.",
            "Proficiency testing is performed and results are reviewed for each regulated analyte.",
            "Personnel qualifications and competency assessments are documented.",
        ],
    ),
    (
        "Occupational Safety and Health Administration (OSHA) Standards",
        "Workplace safety, including bloodborne pathogens",
        &[
            "A written bloodborne pathogens exposure control plan is reviewed annually.",
            "Employees receive safety training at hire and annually thereafter.",
            "Workplace injuries and illnesses are recorded on OSHA logs.",
        ],
    ),
    (
        "Centers for Medicare and Medicaid Services (CMS)",
        "Conditions of participation and billing integrity",
        &[
            "Claims submitted to Medicare and Medicaid are supported by medical record documentation.",
            "Excluded individuals and entities are screened monthly against the OIG exclusion list.",
            "Patient rights notices are provided at admission.",
        ],
    ),
    (
        "Anti-Kickback Statute (AKS) and Stark Law",
        "Referral and financial relationship restrictions",
        &[
            "Financial relationships with referring physicians are documented in signed written agreements.",
            "Compensation arrangements are set at fair market value and not tied to referral volume.",
            "A compliance review is performed before entering any new referral-source arrangement.",
        ],
    ),
    (
        "Patient Safety and Quality Improvement Act (PSQIA)",
        "Confidential patient safety work product",
        &[
            "Patient safety work product is reported only to a listed Patient Safety Organization.",
            "A patient safety evaluation system is documented and maintained.",
            "Confidentiality of patient safety work product is protected from unauthorized disclosure.",
        ],
    ),
    (
        "Electronic Health Record (EHR) Compliance",
        "Certified EHR technology and record integrity",
        &[
            "The EHR system is certified under the ONC Health IT Certification Program.",
            "Audit logs record every access to and change of patient records.",
            "Information blocking is avoided and patients can access their records electronically.",
        ],
    ),
];
