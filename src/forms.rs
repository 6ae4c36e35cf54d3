//! Admin form submissions and their normalization into store inputs.
//!
//! Forms keep every submitted value as raw text so a rejected submission can
//! be rendered back into the form unchanged.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::db::models::{
    Education, Experience, Portfolio, PortfolioInput, Profile, ProfileInput, Skill, SkillLevel,
    SocialLinks,
};

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("Invalid skill on line {line}: {reason}")]
    Skill { line: usize, reason: String },
    #[error("Invalid {section} entry on line {line}: expected 4 fields separated by '|'")]
    Entry { section: &'static str, line: usize },
}

/// Raw portfolio form fields as submitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioForm {
    pub title: String,
    pub description: String,
    pub category: String,
    pub technologies: String,
    pub project_url: String,
    pub github_url: String,
    pub featured: bool,
    pub order: String,
    /// Current image, shown on the edit form.
    pub image_url: String,
}

impl PortfolioForm {
    pub fn from_fields(mut fields: HashMap<String, String>) -> Self {
        let mut take = |key: &str| fields.remove(key).unwrap_or_default();
        Self {
            title: take("title"),
            description: take("description"),
            category: take("category"),
            technologies: take("technologies"),
            project_url: take("projectUrl"),
            github_url: take("githubUrl"),
            featured: parse_checkbox(&take("featured")),
            order: take("order"),
            image_url: String::new(),
        }
    }

    pub fn from_portfolio(portfolio: &Portfolio) -> Self {
        Self {
            title: portfolio.title.clone(),
            description: portfolio.description.clone(),
            category: portfolio.category.clone(),
            technologies: portfolio.technologies.join(", "),
            project_url: portfolio.project_url.clone().unwrap_or_default(),
            github_url: portfolio.github_url.clone().unwrap_or_default(),
            featured: portfolio.featured,
            order: portfolio.order.to_string(),
            image_url: portfolio.image_url.clone(),
        }
    }

    /// Check required fields and normalize the rest.
    pub fn validate(&self) -> Result<PortfolioInput, ValidationError> {
        Ok(PortfolioInput {
            title: required("Title", &self.title)?,
            description: required("Description", &self.description)?,
            category: required("Category", &self.category)?,
            technologies: split_technologies(&self.technologies),
            project_url: optional(&self.project_url),
            github_url: optional(&self.github_url),
            image_url: None,
            featured: self.featured,
            order: parse_order(&self.order),
        })
    }
}

/// Raw profile form fields as submitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileForm {
    pub name: String,
    pub title: String,
    pub bio: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub github: String,
    pub linkedin: String,
    pub twitter: String,
    pub instagram: String,
    pub facebook: String,
    pub skills: Option<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub avatar: String,
}

impl ProfileForm {
    pub fn from_fields(mut fields: HashMap<String, String>) -> Self {
        let skills = fields.remove("skills");
        let experience = fields.remove("experience");
        let education = fields.remove("education");
        let mut take = |key: &str| fields.remove(key).unwrap_or_default();
        Self {
            name: take("name"),
            title: take("title"),
            bio: take("bio"),
            email: take("email"),
            phone: take("phone"),
            location: take("location"),
            github: take("github"),
            linkedin: take("linkedin"),
            twitter: take("twitter"),
            instagram: take("instagram"),
            facebook: take("facebook"),
            skills,
            experience,
            education,
            avatar: String::new(),
        }
    }

    pub fn from_profile(profile: &Profile) -> Self {
        let social = &profile.social;
        Self {
            name: profile.name.clone(),
            title: profile.title.clone(),
            bio: profile.bio.clone(),
            email: profile.email.clone(),
            phone: profile.phone.clone(),
            location: profile.location.clone(),
            github: social.github.clone().unwrap_or_default(),
            linkedin: social.linkedin.clone().unwrap_or_default(),
            twitter: social.twitter.clone().unwrap_or_default(),
            instagram: social.instagram.clone().unwrap_or_default(),
            facebook: social.facebook.clone().unwrap_or_default(),
            skills: Some(
                profile
                    .skills
                    .iter()
                    .map(|s| format!("{}: {}", s.name, s.level))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            experience: Some(
                profile
                    .experience
                    .iter()
                    .map(|e| format!("{} | {} | {} | {}", e.title, e.company, e.period, e.description))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            education: Some(
                profile
                    .education
                    .iter()
                    .map(|e| {
                        format!("{} | {} | {} | {}", e.degree, e.institution, e.period, e.description)
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            avatar: profile.avatar.clone(),
        }
    }

    pub fn validate(&self) -> Result<ProfileInput, ValidationError> {
        Ok(ProfileInput {
            name: required("Name", &self.name)?,
            title: required("Title", &self.title)?,
            bio: required("Bio", &self.bio)?,
            email: required("Email", &self.email)?,
            phone: self.phone.trim().to_string(),
            location: self.location.trim().to_string(),
            social: SocialLinks {
                github: optional(&self.github),
                linkedin: optional(&self.linkedin),
                twitter: optional(&self.twitter),
                instagram: optional(&self.instagram),
                facebook: optional(&self.facebook),
            },
            avatar: None,
            skills: self.skills.as_deref().map(parse_skills).transpose()?,
            experience: self
                .experience
                .as_deref()
                .map(|text| {
                    parse_entries(text, "experience", |[title, company, period, description]| {
                        Experience {
                            title,
                            company,
                            period,
                            description,
                        }
                    })
                })
                .transpose()?,
            education: self
                .education
                .as_deref()
                .map(|text| {
                    parse_entries(text, "education", |[degree, institution, period, description]| {
                        Education {
                            degree,
                            institution,
                            period,
                            description,
                        }
                    })
                })
                .transpose()?,
        })
    }
}

fn required(name: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ValidationError::Required(name))
    } else {
        Ok(value.to_string())
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// `"a, b ,c"` becomes `["a", "b", "c"]`; empty segments are dropped.
pub fn split_technologies(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Leading integer of the input, 0 when there is none.
pub fn parse_order(raw: &str) -> i32 {
    let raw = raw.trim();
    let sign_len = usize::from(raw.starts_with('-') || raw.starts_with('+'));
    let digits = raw[sign_len..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(raw.len(), |pos| pos + sign_len);
    raw[..digits].parse().unwrap_or(0)
}

/// HTML checkboxes submit `on` when ticked and nothing otherwise.
pub fn parse_checkbox(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "on" | "true" | "1" | "yes")
}

fn parse_skills(text: &str) -> Result<Vec<Skill>, ValidationError> {
    non_blank_lines(text)
        .map(|(line, content)| {
            let (name, level) = content
                .rsplit_once(':')
                .ok_or_else(|| ValidationError::Skill {
                    line,
                    reason: "expected 'name: level'".to_string(),
                })?;
            let name = name.trim();
            if name.is_empty() {
                return Err(ValidationError::Skill {
                    line,
                    reason: "missing name".to_string(),
                });
            }
            let level = level
                .parse::<SkillLevel>()
                .map_err(|reason| ValidationError::Skill { line, reason })?;
            Ok(Skill {
                name: name.to_string(),
                level,
            })
        })
        .collect()
}

fn parse_entries<T>(
    text: &str,
    section: &'static str,
    build: impl Fn([String; 4]) -> T,
) -> Result<Vec<T>, ValidationError> {
    non_blank_lines(text)
        .map(|(line, content)| {
            let parts: Vec<String> = content.splitn(4, '|').map(|p| p.trim().to_string()).collect();
            let parts: [String; 4] = parts
                .try_into()
                .map_err(|_| ValidationError::Entry { section, line })?;
            Ok(build(parts))
        })
        .collect()
}

fn non_blank_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_technologies_are_split_and_trimmed() {
        assert_eq!(split_technologies("a, b ,c"), vec!["a", "b", "c"]);
        assert_eq!(split_technologies(""), Vec::<String>::new());
        assert_eq!(split_technologies("rust,, axum "), vec!["rust", "axum"]);
    }

    #[test]
    fn test_order_parsing_falls_back_to_zero() {
        assert_eq!(parse_order("3"), 3);
        assert_eq!(parse_order(" 12abc"), 12);
        assert_eq!(parse_order("-2"), -2);
        assert_eq!(parse_order("abc"), 0);
        assert_eq!(parse_order(""), 0);
        assert_eq!(parse_order("99999999999"), 0);
    }

    #[test]
    fn test_checkbox_values() {
        assert!(parse_checkbox("on"));
        assert!(parse_checkbox("true"));
        assert!(!parse_checkbox(""));
        assert!(!parse_checkbox("off"));
    }

    #[test]
    fn test_portfolio_form_normalizes() {
        let form = PortfolioForm::from_fields(fields(&[
            ("title", " Site "),
            ("description", "A website"),
            ("category", "web"),
            ("technologies", "a, b ,c"),
            ("projectUrl", ""),
            ("githubUrl", "https://github.com/me/site"),
            ("featured", "on"),
            ("order", "not-a-number"),
        ]));
        let input = form.validate().unwrap();
        assert_eq!(input.title, "Site");
        assert_eq!(input.technologies, vec!["a", "b", "c"]);
        assert_eq!(input.project_url, None);
        assert_eq!(input.github_url.as_deref(), Some("https://github.com/me/site"));
        assert!(input.featured);
        assert_eq!(input.order, 0);
        assert_eq!(input.image_url, None);
    }

    #[test]
    fn test_portfolio_form_requires_fields() {
        let form = PortfolioForm::from_fields(fields(&[("title", "T"), ("description", "D")]));
        assert_eq!(form.validate(), Err(ValidationError::Required("Category")));

        let form = PortfolioForm::from_fields(fields(&[("description", "D"), ("category", "web")]));
        assert_eq!(form.validate(), Err(ValidationError::Required("Title")));
    }

    #[test]
    fn test_profile_form_parses_sections() {
        let form = ProfileForm::from_fields(fields(&[
            ("name", "Jane"),
            ("title", "Engineer"),
            ("bio", "Builds things"),
            ("email", "jane@example.com"),
            ("github", "https://github.com/jane"),
            ("skills", "Rust: expert\n\nSQL: intermediate"),
            ("experience", "Dev | Acme | 2020-2023 | Shipped code"),
        ]));
        let input = form.validate().unwrap();
        assert_eq!(input.skills.as_ref().map(Vec::len), Some(2));
        assert_eq!(input.skills.unwrap()[0].level, SkillLevel::Expert);
        assert_eq!(input.experience.unwrap()[0].company, "Acme");
        assert!(input.education.is_none());
        assert_eq!(input.social.github.as_deref(), Some("https://github.com/jane"));
        assert!(input.social.twitter.is_none());
        assert!(input.avatar.is_none());
    }

    #[test]
    fn test_profile_form_rejects_bad_lines() {
        let mut form = ProfileForm {
            name: "Jane".to_string(),
            title: "Engineer".to_string(),
            bio: "Bio".to_string(),
            email: "jane@example.com".to_string(),
            skills: Some("Rust - expert".to_string()),
            ..ProfileForm::default()
        };
        assert!(matches!(form.validate(), Err(ValidationError::Skill { line: 1, .. })));

        form.skills = Some("Rust: guru".to_string());
        assert!(matches!(form.validate(), Err(ValidationError::Skill { .. })));

        form.skills = None;
        form.education = Some("BSc | Uni".to_string());
        assert_eq!(
            form.validate(),
            Err(ValidationError::Entry {
                section: "education",
                line: 1
            })
        );
    }

    #[test]
    fn test_profile_form_roundtrips_through_profile() {
        let mut profile = Profile::placeholder();
        profile.skills = vec![Skill {
            name: "Rust".to_string(),
            level: SkillLevel::Advanced,
        }];
        let form = ProfileForm::from_profile(&profile);
        let input = form.validate().unwrap();
        assert_eq!(input.skills.unwrap(), profile.skills);
        assert_eq!(input.experience.unwrap(), vec![]);
    }
}
