use super::document::{texts_in, RenderedDocument};
use crate::errors::{Result, ScrapeError};
use crate::types::{ScorecardRow, Subject};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldName {
    Category,
    Percent,
    Total,
}

impl FieldName {
    pub const ALL: [FieldName; 3] = [FieldName::Category, FieldName::Percent, FieldName::Total];
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldName::Category => "category",
            FieldName::Percent => "percent",
            FieldName::Total => "total",
        };
        f.write_str(name)
    }
}

/// CSS selectors for each scorecard field. Each should match one element per
/// scorecard on the page, in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSelectors {
    pub category: String,
    pub percent: String,
    pub total: String,
}

impl Default for FieldSelectors {
    fn default() -> Self {
        Self {
            category: ".m-scorecard__title".to_string(),
            percent: ".m-scorecard__value".to_string(),
            total: ".m-scorecard__checks".to_string(),
        }
    }
}

impl FieldSelectors {
    pub fn get(&self, field: FieldName) -> &str {
        match field {
            FieldName::Category => &self.category,
            FieldName::Percent => &self.percent,
            FieldName::Total => &self.total,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &str)> + '_ {
        FieldName::ALL.into_iter().map(move |field| (field, self.get(field)))
    }

    pub fn compile(&self) -> Result<CompiledFields> {
        let parse = |field: FieldName| {
            let raw = self.get(field);
            Selector::parse(raw)
                .map_err(|e| ScrapeError::InvalidSelector(format!("{} ({}): {}", raw, field, e)))
        };

        Ok(CompiledFields {
            category: parse(FieldName::Category)?,
            percent: parse(FieldName::Percent)?,
            total: parse(FieldName::Total)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CompiledFields {
    category: Selector,
    percent: Selector,
    total: Selector,
}

/// Turns a rendered profile page into scorecard rows.
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    fields: CompiledFields,
}

impl RecordExtractor {
    pub fn new(selectors: &FieldSelectors) -> Result<Self> {
        Ok(Self {
            fields: selectors.compile()?,
        })
    }

    /// Rows zipped positionally from the three field lists. A page with no
    /// scorecards yields no rows; lists of unequal length are rejected.
    pub fn extract(&self, doc: &RenderedDocument, subject: &Subject) -> Result<Vec<ScorecardRow>> {
        let html = doc.parse();
        let categories = texts_in(&html, &self.fields.category);
        let percents = texts_in(&html, &self.fields.percent);
        let totals = texts_in(&html, &self.fields.total);

        if categories.len() != percents.len() || categories.len() != totals.len() {
            return Err(ScrapeError::MalformedPage {
                subject: subject.clone(),
                category: categories.len(),
                percent: percents.len(),
                total: totals.len(),
            });
        }

        let rows: Vec<ScorecardRow> = categories
            .into_iter()
            .zip(percents)
            .zip(totals)
            .map(|((category, percent), total)| {
                ScorecardRow::new(subject.clone(), category, percent, total)
            })
            .collect();

        debug!(subject = %subject, url = %doc.url, rows = rows.len(), "extracted scorecards");
        Ok(rows)
    }
}

/// One-shot form of [`RecordExtractor::extract`].
pub fn extract(
    doc: &RenderedDocument,
    subject: &Subject,
    selectors: &FieldSelectors,
) -> Result<Vec<ScorecardRow>> {
    RecordExtractor::new(selectors)?.extract(doc, subject)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHelper;

    fn doc(html: String) -> RenderedDocument {
        RenderedDocument::new("https://example.com/p/alice", html)
    }

    #[test]
    fn test_one_row_per_scorecard_in_dom_order() {
        let alice = Subject::new("alice");
        let page = TestHelper::scorecard_page(&[
            ("True", "80%", "5"),
            ("Half True", "50%", "10"),
            ("Pants on Fire!", "1%", "1"),
        ]);

        let rows = extract(&doc(page), &alice, &FieldSelectors::default()).unwrap();

        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.person == alice));
        assert_eq!(rows[0], ScorecardRow::new(alice.clone(), "True", "80%", "5"));
        assert_eq!(rows[1].category, "Half True");
        assert_eq!(rows[2].category, "Pants on Fire!");
        assert_eq!(rows[2].total, "1");
    }

    #[test]
    fn test_empty_profile_yields_no_rows() {
        let rows = extract(
            &doc(TestHelper::scorecard_page(&[])),
            &Subject::new("bob"),
            &FieldSelectors::default(),
        )
        .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_mismatched_lists_are_malformed() {
        let html = r#"<html><body>
            <div class="m-scorecard__title">True</div>
            <div class="m-scorecard__title">False</div>
            <div class="m-scorecard__title">Half True</div>
            <div class="m-scorecard__value">10%</div>
            <div class="m-scorecard__value">20%</div>
            <div class="m-scorecard__checks">1</div>
            <div class="m-scorecard__checks">2</div>
            <div class="m-scorecard__checks">3</div>
        </body></html>"#;

        let err = extract(
            &doc(html.to_string()),
            &Subject::new("carol"),
            &FieldSelectors::default(),
        )
        .unwrap_err();

        match err {
            ScrapeError::MalformedPage {
                subject,
                category,
                percent,
                total,
            } => {
                assert_eq!(subject.as_str(), "carol");
                assert_eq!((category, percent, total), (3, 2, 3));
            }
            other => panic!("expected MalformedPage, got {other:?}"),
        }
    }

    #[test]
    fn test_custom_selectors() {
        let html = r#"<table>
            <tr><td class="c">Mostly True</td><td class="p">30%</td><td class="t">12 Checks</td></tr>
        </table>"#;
        let selectors = FieldSelectors {
            category: "td.c".to_string(),
            percent: "td.p".to_string(),
            total: "td.t".to_string(),
        };

        let rows = extract(&doc(html.to_string()), &Subject::new("dave"), &selectors).unwrap();
        assert_eq!(
            rows,
            vec![ScorecardRow::new(Subject::new("dave"), "Mostly True", "30%", "12 Checks")]
        );
    }

    #[test]
    fn test_invalid_selector() {
        let selectors = FieldSelectors {
            percent: "div[".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            RecordExtractor::new(&selectors),
            Err(ScrapeError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_extract_leaves_document_untouched() {
        let page = TestHelper::scorecard_page(&[("False", "20%", "4")]);
        let document = doc(page.clone());
        let extractor = RecordExtractor::new(&FieldSelectors::default()).unwrap();

        let first = extractor.extract(&document, &Subject::new("erin")).unwrap();
        let second = extractor.extract(&document, &Subject::new("erin")).unwrap();

        assert_eq!(first, second);
        assert_eq!(document.html, page);
    }
}
