//! Title-length and promotional-content filtering.

use crate::config::FilterSettings;
use crate::models::Article;

/// Why an article was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    EmptyField,
    ShortTitle,
    /// Carries the denylist entry that matched.
    Promotional(String),
}

/// Check a single article against the filter settings.
pub fn check(article: &Article, settings: &FilterSettings) -> Result<(), Rejection> {
    if article.title.trim().is_empty() || article.link.trim().is_empty() {
        return Err(Rejection::EmptyField);
    }
    if article.title.chars().count() <= settings.min_title_len {
        return Err(Rejection::ShortTitle);
    }
    let lowered = article.title.to_lowercase();
    if let Some(hit) = settings
        .denylist
        .iter()
        .find(|phrase| lowered.contains(&phrase.to_lowercase()))
    {
        return Err(Rejection::Promotional(hit.clone()));
    }
    Ok(())
}

/// Keep only the articles that pass [`check`], in their original order.
pub fn apply(articles: Vec<Article>, settings: &FilterSettings) -> Vec<Article> {
    articles
        .into_iter()
        .filter(|article| match check(article, settings) {
            Ok(()) => true,
            Err(reason) => {
                tracing::trace!(title = %article.title, ?reason, "Filtered article");
                false
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str) -> Article {
        Article {
            title: title.to_string(),
            link: format!("https://example.com/{}", title.len()),
            date: 0,
            source: None,
            source_url: None,
            image: None,
            ai_image: None,
        }
    }

    #[test]
    fn test_title_length_boundary() {
        let settings = FilterSettings::default();
        assert_eq!(check(&article("0123456789"), &settings), Err(Rejection::ShortTitle));
        assert_eq!(check(&article("0123456789a"), &settings), Ok(()));
        // counted in characters, not bytes
        assert_eq!(check(&article("ééééééééééé"), &settings), Ok(()));
    }

    #[test]
    fn test_promotional_denylist() {
        let settings = FilterSettings::default();
        assert_eq!(
            check(&article("Free tickets to TechCrunch Disrupt — save 50%"), &settings),
            Err(Rejection::Promotional("tickets".to_string()))
        );
        assert_eq!(
            check(&article("Last CHANCE: grab a DISCOUNT on AI courses"), &settings),
            Err(Rejection::Promotional("discount".to_string()))
        );
    }

    #[test]
    fn test_denylist_is_case_insensitive_both_ways() {
        let settings = FilterSettings {
            min_title_len: 10,
            denylist: vec!["Promo Code".to_string()],
        };
        assert!(check(&article("Use this promo code for AI credits"), &settings).is_err());
    }

    #[test]
    fn test_empty_link_rejected() {
        let mut a = article("A perfectly fine headline");
        a.link = "  ".to_string();
        assert_eq!(check(&a, &FilterSettings::default()), Err(Rejection::EmptyField));
    }

    #[test]
    fn test_apply_keeps_order() {
        let articles = vec![
            article("Anthropic releases new interpretability paper"),
            article("Too short"),
            article("Webinar: scaling your LLM stack"),
            article("Google DeepMind solves another protein problem"),
        ];
        let kept = apply(articles, &FilterSettings::default());
        let titles: Vec<&str> = kept.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Anthropic releases new interpretability paper",
                "Google DeepMind solves another protein problem"
            ]
        );
    }
}
