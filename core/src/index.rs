use crate::tokenizer::tokenize;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

pub type DocIndex = usize;

/// Number of documents handed back by [`KnowledgeBase::search`].
pub const TOP_K: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    pub title: String,
    pub content: String,
}

impl KnowledgeDocument {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self { title: title.into(), content: content.into() }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub postings: HashMap<String, BTreeSet<DocIndex>>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    pub fn build(docs: &[KnowledgeDocument]) -> Self {
        let mut index = Self::new();
        for (doc_index, doc) in docs.iter().enumerate() {
            let text = format!("{} {}", doc.title, doc.content);
            for token in tokenize(&text) {
                index.postings.entry(token).or_default().insert(doc_index);
            }
        }
        index
    }

    pub fn get(&self, token: &str) -> Option<&BTreeSet<DocIndex>> {
        self.postings.get(token)
    }

    pub fn num_terms(&self) -> usize { self.postings.len() }
}

/// A static corpus together with its index. Nothing mutates either after construction.
#[derive(Debug)]
pub struct KnowledgeBase {
    docs: Vec<KnowledgeDocument>,
    index: InvertedIndex,
}

lazy_static! {
    static ref BUILTIN: KnowledgeBase = KnowledgeBase::new(builtin_corpus());
}

impl KnowledgeBase {
    pub fn new(docs: Vec<KnowledgeDocument>) -> Self {
        let index = InvertedIndex::build(&docs);
        tracing::debug!(num_docs = docs.len(), num_terms = index.num_terms(), "knowledge index built");
        Self { docs, index }
    }

    /// The process-wide index over the built-in corpus.
    pub fn builtin() -> &'static KnowledgeBase {
        &BUILTIN
    }

    pub fn docs(&self) -> &[KnowledgeDocument] { &self.docs }

    pub fn index(&self) -> &InvertedIndex { &self.index }

    /// Documents ranked by how many query tokens hit them, best first.
    /// Ties keep corpus order. Returns at most [`TOP_K`] documents.
    pub fn search(&self, query: &str) -> Vec<&KnowledgeDocument> {
        self.ranked(query)
            .into_iter()
            .take(TOP_K)
            .map(|(doc_index, _)| &self.docs[doc_index])
            .collect()
    }

    /// Every matching document with its hit count.
    pub fn ranked(&self, query: &str) -> Vec<(DocIndex, usize)> {
        let mut counts: Vec<usize> = vec![0; self.docs.len()];
        for token in tokenize(query) {
            if let Some(postings) = self.index.get(&token) {
                for &doc_index in postings {
                    counts[doc_index] += 1;
                }
            }
        }
        let mut scored: Vec<(DocIndex, usize)> =
            counts.into_iter().enumerate().filter(|(_, hits)| *hits > 0).collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        tracing::debug!(query, hits = scored.len(), "knowledge search");
        scored
    }
}

pub fn builtin_corpus() -> Vec<KnowledgeDocument> {
    vec![
        KnowledgeDocument::new(
            "NUST Information",
            "NUST (National University of Sciences and Technology) is a premier institution located in Islamabad.
Programs: Engineering (Electrical, Mechanical, Civil, Computer), Computer Science, Business Studies, Natural Sciences
Admission process: NET (NUST Entrance Test) is required
Fall admissions usually open in June-July
Spring admissions usually open in December-January
Website: https://nust.edu.pk/
Campuses: Main campus in Islamabad, with additional campuses in Rawalpindi and Karachi
Scholarships available: Merit-based, Need-based, Sports, and others
Housing: On-campus hostels available for both male and female students",
        ),
        KnowledgeDocument::new(
            "LUMS Information",
            "LUMS (Lahore University of Management Sciences) is a leading private university in Lahore.
Programs: Business Administration, Computer Science, Engineering, Economics, Social Sciences
Admission process: LUMS SSE test for Science programs, LCAT for Business and Social Sciences
Fall admissions usually open in November-December
Financial aid: Need-blind admissions with comprehensive financial aid packages
Website: https://lums.edu.pk/
Housing: On-campus housing available with multiple options
Notable features: Liberal arts education model, strong entrepreneurship focus
Research centers: Centre for Water Informatics & Technology, Technology for People Initiative",
        ),
        KnowledgeDocument::new(
            "IBA Information",
            "IBA (Institute of Business Administration) is one of the oldest business schools in Pakistan, located in Karachi.
Programs: BBA, MBA, EMBA, BS Computer Science, BS Economics, BS Social Sciences
Admission process: Aptitude test and interviews
Fall admissions usually open in March-April
Spring admissions usually open in October-November
Website: https://www.iba.edu.pk/
Campuses: Main Campus and City Campus, both in Karachi
Financial assistance: Merit scholarships and need-based financial aid available
Recognized for: Strong industry connections, high graduate employability",
        ),
        KnowledgeDocument::new(
            "Pakistan University Admission Cycles",
            "Most Pakistani universities follow two main admission cycles:
Fall/Autumn Semester:
- Applications usually open: June-July
- Classes start: September-October
- This is the main intake with most programs available
Spring Semester:
- Applications usually open: November-December
- Classes start: January-February
- Limited programs may be available",
        ),
        KnowledgeDocument::new(
            "ScrapeMyUni Features",
            "ScrapeMyUni helps Pakistani students with university applications through these key features:
University Comparison: Side-by-side comparison of universities, filter by location, programs, and fees
Deadline Tracking: Calendar view of upcoming deadlines, email/notification reminders
Program Search: Find programs by discipline, duration, and university
Application Management: Track application status, document checklist and storage
Scholarship Information: Filter scholarships by eligibility, view application requirements",
        ),
    ]
}
