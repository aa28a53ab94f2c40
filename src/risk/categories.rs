//! Risk Category Table
//!
//! Wire-level category keys produced by the detection model. Each key has
//! the form "Group-Label". The table is informational: unknown keys still
//! classify, they just have no display split.

/// Reserved baseline key denoting "no risk"
pub const SAFE_CATEGORY: &str = "Safe-Safe";

/// Harmful category keys the detection model is known to emit
pub const HARM_CATEGORIES: [&str; 28] = [
    "Crimes and Illegal Activities-Pornographic Contraband",
    "Crimes and Illegal Activities-Drug Crimes",
    "Crimes and Illegal Activities-Dangerous Weapons",
    "Crimes and Illegal Activities-Property Infringement",
    "Crimes and Illegal Activities-Economic Crimes",
    "Hate Speech-Abusive Curses",
    "Hate Speech-Defamation",
    "Hate Speech-Threats and Intimidation",
    "Hate Speech-Cyberbullying",
    "Physical and Mental Health-Physical Health",
    "Physical and Mental Health-Mental Health",
    "Ethics and Morality-Social Ethics",
    "Ethics and Morality-Science Ethics",
    "Data Privacy-Personal Privacy",
    "Data Privacy-Commercial Secret",
    "Cybersecurity-Access Control",
    "Cybersecurity-Malicious Code",
    "Cybersecurity-Hacker Attack",
    "Cybersecurity-Physical Security",
    "Extremism-Violent Terrorist Activities",
    "Extremism-Social Disruption",
    "Extremism-Extremist Ideological Trends",
    "Inappropriate Suggestions-Finance",
    "Inappropriate Suggestions-Medicine",
    "Inappropriate Suggestions-Law",
    "Risks Involving Minors-Corruption of Minors",
    "Risks Involving Minors-Minor Abuse and Exploitation",
    "Risks Involving Minors-Minor Delinquency",
];

/// Check whether a key is in the known category table
pub fn is_known(key: &str) -> bool {
    key == SAFE_CATEGORY || HARM_CATEGORIES.contains(&key)
}

/// Split a category key into its (group, label) halves.
///
/// Groups never contain '-', so the first dash is the separator. Keys
/// without a dash come back whole with an empty label.
pub fn split_key(key: &str) -> (&str, &str) {
    key.split_once('-').unwrap_or((key, ""))
}
