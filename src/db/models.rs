//! Database Models - records stored in the portfolio and profile collections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Portfolio entry
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub technologies: Vec<String>,
    pub project_url: Option<String>,
    pub github_url: Option<String>,
    pub image_url: String,
    pub featured: bool,
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated portfolio fields for create and update.
///
/// `image_url` is `None` when the submission carried no new upload; on update
/// the stored image is then left as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioInput {
    pub title: String,
    pub description: String,
    pub category: String,
    pub technologies: Vec<String>,
    pub project_url: Option<String>,
    pub github_url: Option<String>,
    pub image_url: Option<String>,
    pub featured: bool,
    pub order: i32,
}

impl Portfolio {
    pub fn from_input(input: PortfolioInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            category: input.category,
            technologies: input.technologies,
            project_url: input.project_url,
            github_url: input.github_url,
            image_url: input.image_url.unwrap_or_default(),
            featured: input.featured,
            order: input.order,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace every mutable field; the image only when a new one was uploaded.
    pub fn apply(&mut self, input: PortfolioInput) {
        self.title = input.title;
        self.description = input.description;
        self.category = input.category;
        self.technologies = input.technologies;
        self.project_url = input.project_url;
        self.github_url = input.github_url;
        if let Some(image_url) = input.image_url {
            self.image_url = image_url;
        }
        self.featured = input.featured;
        self.order = input.order;
        self.updated_at = Utc::now();
    }
}

/// Exact-match filters for public listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioFilter {
    pub category: Option<String>,
    pub featured: Option<bool>,
}

impl PortfolioFilter {
    pub fn matches(&self, portfolio: &Portfolio) -> bool {
        self.category
            .as_ref()
            .map_or(true, |category| &portfolio.category == category)
            && self.featured.map_or(true, |featured| portfolio.featured == featured)
    }
}

/// One page of the admin listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioPage {
    pub items: Vec<Portfolio>,
    pub current_page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PortfolioPage {
    pub fn new(items: Vec<Portfolio>, current_page: i64, per_page: i64, total: i64) -> Self {
        let total_pages = (total + per_page - 1) / per_page;
        Self {
            items,
            current_page,
            per_page,
            total,
            total_pages,
            has_next: current_page < total_pages,
            has_prev: current_page > 1,
        }
    }

    /// Rows to skip for `page`; pages past the end saturate instead of wrapping.
    pub fn offset(page: i64, per_page: i64) -> i64 {
        (page.max(1) - 1).saturating_mul(per_page.max(0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl std::str::FromStr for SkillLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(SkillLevel::Beginner),
            "intermediate" => Ok(SkillLevel::Intermediate),
            "advanced" => Ok(SkillLevel::Advanced),
            "expert" => Ok(SkillLevel::Expert),
            other => Err(format!("unknown skill level '{}'", other)),
        }
    }
}

impl std::fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkillLevel::Beginner => write!(f, "beginner"),
            SkillLevel::Intermediate => write!(f, "intermediate"),
            SkillLevel::Advanced => write!(f, "advanced"),
            SkillLevel::Expert => write!(f, "expert"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub level: SkillLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub title: String,
    pub company: String,
    pub period: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    pub period: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub instagram: Option<String>,
    pub facebook: Option<String>,
}

/// Site owner profile. There is only ever one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub title: String,
    pub bio: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub avatar: String,
    pub resume: String,
    pub social: SocialLinks,
    pub skills: Vec<Skill>,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub updated_at: DateTime<Utc>,
}

/// Validated profile fields.
///
/// `None` on an optional field keeps what is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileInput {
    pub name: String,
    pub title: String,
    pub bio: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub social: SocialLinks,
    pub avatar: Option<String>,
    pub skills: Option<Vec<Skill>>,
    pub experience: Option<Vec<Experience>>,
    pub education: Option<Vec<Education>>,
}

impl Profile {
    /// Placeholder record shown the first time the admin opens the profile form.
    pub fn placeholder() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: "Your Name".to_string(),
            title: "Full Stack Developer".to_string(),
            bio: "Passionate developer building modern web applications.".to_string(),
            email: "contact@example.com".to_string(),
            phone: String::new(),
            location: String::new(),
            avatar: String::new(),
            resume: String::new(),
            social: SocialLinks {
                github: Some("https://github.com/".to_string()),
                linkedin: Some("https://linkedin.com/".to_string()),
                ..SocialLinks::default()
            },
            skills: Vec::new(),
            experience: Vec::new(),
            education: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn from_input(input: ProfileInput) -> Self {
        let mut profile = Self {
            id: Uuid::new_v4(),
            name: String::new(),
            title: String::new(),
            bio: String::new(),
            email: String::new(),
            phone: String::new(),
            location: String::new(),
            avatar: String::new(),
            resume: String::new(),
            social: SocialLinks::default(),
            skills: Vec::new(),
            experience: Vec::new(),
            education: Vec::new(),
            updated_at: Utc::now(),
        };
        profile.merge(input);
        profile
    }

    /// Shallow field replacement; stamps `updated_at`.
    pub fn merge(&mut self, input: ProfileInput) {
        self.name = input.name;
        self.title = input.title;
        self.bio = input.bio;
        self.email = input.email;
        self.phone = input.phone;
        self.location = input.location;
        self.social = input.social;
        if let Some(avatar) = input.avatar {
            self.avatar = avatar;
        }
        if let Some(skills) = input.skills {
            self.skills = skills;
        }
        if let Some(experience) = input.experience {
            self.experience = experience;
        }
        if let Some(education) = input.education {
            self.education = education;
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str, category: &str) -> PortfolioInput {
        PortfolioInput {
            title: title.to_string(),
            description: "desc".to_string(),
            category: category.to_string(),
            technologies: vec![],
            project_url: None,
            github_url: None,
            image_url: None,
            featured: false,
            order: 0,
        }
    }

    #[test]
    fn test_apply_keeps_image_without_new_upload() {
        let mut portfolio = Portfolio::from_input(PortfolioInput {
            image_url: Some("/uploads/1-2.png".to_string()),
            ..input("First", "web")
        });
        portfolio.apply(input("Renamed", "mobile"));
        assert_eq!(portfolio.title, "Renamed");
        assert_eq!(portfolio.category, "mobile");
        assert_eq!(portfolio.image_url, "/uploads/1-2.png");
    }

    #[test]
    fn test_filter_matches_exactly() {
        let mut portfolio = Portfolio::from_input(input("A", "web"));
        portfolio.featured = true;

        assert!(PortfolioFilter::default().matches(&portfolio));
        assert!(PortfolioFilter {
            category: Some("web".to_string()),
            featured: Some(true)
        }
        .matches(&portfolio));
        assert!(!PortfolioFilter {
            category: Some("Web".to_string()),
            featured: None
        }
        .matches(&portfolio));
        assert!(!PortfolioFilter {
            category: None,
            featured: Some(false)
        }
        .matches(&portfolio));
    }

    #[test]
    fn test_page_math() {
        let page = PortfolioPage::new(vec![], 1, 10, 21);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next);
        assert!(!page.has_prev);

        let page = PortfolioPage::new(vec![], 3, 10, 21);
        assert!(!page.has_next);
        assert!(page.has_prev);

        let page = PortfolioPage::new(vec![], 1, 10, 0);
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next);
        assert_eq!(PortfolioPage::offset(0, 10), 0);
        assert_eq!(PortfolioPage::offset(3, 10), 20);
        assert_eq!(PortfolioPage::offset(i64::MAX, 10), i64::MAX);
    }

    #[test]
    fn test_skill_level_roundtrip_and_serde() {
        assert_eq!("Expert".parse::<SkillLevel>(), Ok(SkillLevel::Expert));
        assert!("guru".parse::<SkillLevel>().is_err());
        let json = serde_json::to_string(&SkillLevel::Intermediate).unwrap();
        assert_eq!(json, "\"intermediate\"");
    }

    #[test]
    fn test_profile_merge_preserves_avatar_and_sequences() {
        let mut profile = Profile::placeholder();
        profile.avatar = "/uploads/me.png".to_string();
        profile.skills = vec![Skill {
            name: "Rust".to_string(),
            level: SkillLevel::Advanced,
        }];

        profile.merge(ProfileInput {
            name: "Jane".to_string(),
            title: "Engineer".to_string(),
            bio: "Bio".to_string(),
            email: "jane@example.com".to_string(),
            phone: String::new(),
            location: String::new(),
            social: SocialLinks::default(),
            avatar: None,
            skills: None,
            experience: Some(vec![]),
            education: None,
        });

        assert_eq!(profile.name, "Jane");
        assert_eq!(profile.avatar, "/uploads/me.png");
        assert_eq!(profile.skills.len(), 1);
        assert!(profile.social.github.is_none());
    }

    #[test]
    fn test_portfolio_serializes_camel_case() {
        let portfolio = Portfolio::from_input(input("A", "web"));
        let value = serde_json::to_value(&portfolio).unwrap();
        assert!(value.get("imageUrl").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("projectUrl").is_some());
    }
}
