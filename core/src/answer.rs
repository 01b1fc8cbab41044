//! Answers assembled locally, without a generative model.

use crate::index::KnowledgeDocument;

pub const KNOWLEDGE_BASE_NOTE: &str = "*Information from ScrapeMyUni's knowledge base*";

pub const IDENTITY_ANSWER: &str = "I'm UniBuddy◕‿◕, an AI assistant that provides information about universities in Pakistan. I'm designed to help with questions about admissions, programs, deadlines, and other university-related inquiries.";

pub const GREETING_ANSWER: &str = "Hi there! I'm UniBuddy◕‿◕, your university assistant. How can I help you today?";

const ABOUT_PATTERNS: &[&str] = &["tell me about", "information about", "what is", "who is"];
const CYCLE_PATTERNS: &[&str] = &["admission cycle", "semester", "academic terms", "when do admissions open"];
const FEATURE_PATTERNS: &[&str] = &["scrapemyuni", "scrapmyuni", "feature", "what can you do", "how do you help"];
const PROGRAM_PATTERNS: &[&str] = &["program", "course", "degree"];

fn mentions(text: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|p| text.contains(p))
}

fn with_note(body: String) -> String {
    format!("{body}\n\n{KNOWLEDGE_BASE_NOTE}")
}

fn first_word(title: &str) -> &str {
    title.split(' ').next().unwrap_or(title)
}

/// Build a Markdown answer straight from the retrieved documents when the
/// query matches one of a few known intents. `None` means the caller should
/// escalate to a generated answer.
pub fn try_direct_answer(query: &str, relevant: &[&KnowledgeDocument]) -> Option<String> {
    let lower = query.to_lowercase();
    let first = relevant.first()?;

    if mentions(&lower, ABOUT_PATTERNS) && first.title.to_lowercase().contains("information") {
        let name = first_word(&first.title);
        if lower.contains(&name.to_lowercase()) {
            let heading = first.title.replace(" Information", "");
            return Some(with_note(format!("## {heading}\n\n{}", first.content)));
        }
    }

    if mentions(&lower, CYCLE_PATTERNS) {
        if let Some(doc) = relevant.iter().find(|d| d.title.to_lowercase().contains("admission cycle")) {
            return Some(with_note(format!("## University Admission Cycles in Pakistan\n\n{}", doc.content)));
        }
    }

    if mentions(&lower, FEATURE_PATTERNS) {
        if let Some(doc) = relevant.iter().find(|d| d.title.to_lowercase().contains("feature")) {
            return Some(with_note(format!("## ScrapeMyUni Features\n\n{}", doc.content)));
        }
    }

    if mentions(&lower, PROGRAM_PATTERNS) {
        for doc in relevant {
            if !(doc.title.contains("Information") && doc.content.contains("Programs:")) {
                continue;
            }
            let name = first_word(&doc.title);
            if !lower.contains(&name.to_lowercase()) {
                continue;
            }
            if let Some(line) = doc.content.lines().find(|l| l.trim().starts_with("Programs:")) {
                return Some(with_note(format!("## Programs at {name}\n\n{line}")));
            }
        }
    }

    None
}

/// Fixed replies that need neither retrieval nor generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickIntent {
    Identity,
    Greeting,
}

impl QuickIntent {
    pub fn detect(text: &str) -> Option<Self> {
        let lower = text.trim().to_lowercase();
        const IDENTITY: &[&str] = &["who are you", "who r u", "what are you", "what r u", "are you", "your name", "call you"];
        if mentions(&lower, IDENTITY)
            || lower == "who"
            || lower == "what"
            || (lower.contains("unibuddy") && lower.contains('?'))
            || (lower.contains("name") && lower.contains('?'))
        {
            return Some(QuickIntent::Identity);
        }
        if ["hello", "hi", "hey", "greetings"].contains(&lower.as_str()) {
            return Some(QuickIntent::Greeting);
        }
        None
    }

    pub fn answer(self) -> &'static str {
        match self {
            QuickIntent::Identity => IDENTITY_ANSWER,
            QuickIntent::Greeting => GREETING_ANSWER,
        }
    }
}

/// Prompt for a generated answer grounded in the retrieved documents.
pub fn rag_prompt(query: &str, relevant: &[&KnowledgeDocument]) -> String {
    let context = relevant
        .iter()
        .map(|d| format!("--- {} ---\n{}", d.title, d.content))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "You are UniBuddy◕‿◕, a friendly assistant for ScrapeMyUni that helps students with university information in Pakistan.

CONTEXT INFORMATION:
{context}

USER QUERY:
{query}

Instructions:
1. Use ONLY the information provided in the CONTEXT above to answer the query.
2. If the exact answer isn't in the context, acknowledge that and provide the most relevant information you do have.
3. Be concise and factual in your response.
4. Format your answer clearly using markdown for better readability.
5. Don't mention that you're using a RAG system or reference this prompt.
6. Add a small note at the end of your response indicating which university or topic from the knowledge base you used (e.g., \"*Based on NUST information*\")."
    )
}

/// Prompt for a generated answer with no retrieved context.
pub fn general_prompt(query: &str) -> String {
    format!(
        "You are a specialized assistant for ScrapeMyUni, a platform that helps Pakistani students find and apply to universities.

SYSTEM CONTEXT:
- You specialize in Pakistani universities, admissions, programs, and education
- ScrapeMyUni helps students compare universities, track application deadlines, and find scholarship opportunities
- Focus on accurate, concise information about Pakistani education system
- When you don't know an answer, acknowledge it rather than making up information

TYPICAL ACADEMIC TERMS:
- Fall Admissions: Usually July-September for classes starting in September/October
- Spring Admissions: Usually November-January for classes starting in January/February
- Most universities follow semester systems

Please answer the following question as helpfully as possible: {query}"
    )
}

struct UniversityFact {
    key: &'static str,
    name: &'static str,
    location: &'static str,
    programs: &'static [&'static str],
    fees: &'static str,
}

const UNIVERSITY_FACTS: &[UniversityFact] = &[
    UniversityFact {
        key: "nust",
        name: "National University of Sciences and Technology (NUST)",
        location: "Islamabad",
        programs: &["Computer Science", "Electrical Engineering", "Mechanical Engineering", "Civil Engineering"],
        fees: "between PKR 180,000 to PKR 250,000 per semester depending on the program",
    },
    UniversityFact {
        key: "lums",
        name: "Lahore University of Management Sciences (LUMS)",
        location: "Lahore",
        programs: &["Computer Science", "Business Administration", "Economics", "Social Sciences"],
        fees: "approximately PKR 350,000 per semester",
    },
    UniversityFact {
        key: "fast",
        name: "FAST National University",
        location: "Multiple campuses in Lahore, Islamabad, Karachi",
        programs: &["Computer Science", "Software Engineering", "Data Science", "Artificial Intelligence"],
        fees: "between PKR 120,000 to PKR 180,000 per semester",
    },
    UniversityFact {
        key: "iba",
        name: "Institute of Business Administration (IBA)",
        location: "Karachi",
        programs: &["Business Administration", "Computer Science", "Economics", "Accounting & Finance"],
        fees: "approximately PKR 250,000 per semester",
    },
    UniversityFact {
        key: "giki",
        name: "Ghulam Ishaq Khan Institute (GIKI)",
        location: "Topi, Swabi",
        programs: &["Electrical Engineering", "Computer Engineering", "Mechanical Engineering"],
        fees: "approximately PKR 300,000 per semester",
    },
    UniversityFact {
        key: "comsats",
        name: "COMSATS University",
        location: "Multiple campuses across Pakistan",
        programs: &["Computer Science", "Engineering", "Business Administration"],
        fees: "between PKR 100,000 to PKR 150,000 per semester",
    },
];

const TOPIC_REPLIES: &[(&[&str], &str)] = &[
    (&["best university", "top university"], "The top universities in Pakistan include NUST, LUMS, GIKI, FAST, IBA, and UET Lahore. The 'best' university depends on your specific field of interest, budget, and location preferences."),
    (&["scholarship"], "Many universities in Pakistan offer scholarships based on merit, need, or both. Government scholarships like HEC and provincial endowment funds are also available. It's best to check each university's financial aid office for specific opportunities."),
    (&["admission", "apply"], "Most universities in Pakistan have online application processes. Generally, you'll need to complete an application form, submit academic transcripts, and pay an application fee. Many universities require entrance tests (like NET, GAT, or university-specific tests)."),
    (&["deadline"], "University application deadlines in Pakistan vary by institution. Generally, Fall admission deadlines range from March to July, while Spring admission deadlines are around October to December. It's always best to check the specific university's admissions page for exact dates."),
    (&["requirement"], "University admission requirements typically include a minimum of 60-70% marks in intermediate or A-levels, entrance test scores (like NET, GAT, or university-specific tests), and sometimes interviews."),
    (&["fee", "cost", "tuition"], "University fees in Pakistan vary widely. Public universities may charge as low as PKR 30,000-40,000 per semester, while private universities like LUMS can charge PKR 350,000 or more per semester."),
    (&["hostel", "accommodation"], "Most major universities in Pakistan offer on-campus hostel accommodation. Hostels typically cost between PKR 15,000-40,000 per semester depending on the university and type of room."),
    (&["program", "course", "degree"], "Pakistani universities offer a wide range of undergraduate and graduate programs. Most bachelor's programs are 4 years, while medicine (MBBS) is 5 years. Master's programs typically range from 1.5 to 2 years."),
];

pub const LOCAL_DEFAULT_REPLY: &str = "I understand you're asking about universities in Pakistan. While I don't have complete information at the moment, I can help with general questions about admissions, programs, scholarships, and fees. Could you please specify which university or aspect of higher education you're interested in?";

/// Keyword reply used when every generated path has failed.
pub fn local_reply(message: &str) -> String {
    let lower = message.to_lowercase();
    for uni in UNIVERSITY_FACTS {
        if !lower.contains(uni.key) {
            continue;
        }
        let programs = uni.programs.join(", ");
        if mentions(&lower, &["program", "course", "degree"]) {
            return format!(
                "{} offers various programs including {programs}. Please check their official website for the complete list and specific requirements.",
                uni.name
            );
        }
        if mentions(&lower, &["fee", "cost", "tuition"]) {
            return format!(
                "The tuition fee at {} is {}. Additional expenses may include hostel fees, books, and other charges.",
                uni.name, uni.fees
            );
        }
        if mentions(&lower, &["location", "where"]) {
            return format!("{} is located in {}.", uni.name, uni.location);
        }
        return format!(
            "{} is located in {} and offers programs including {programs}. The tuition fee is {}.",
            uni.name, uni.location, uni.fees
        );
    }
    TOPIC_REPLIES
        .iter()
        .find(|(keys, _)| mentions(&lower, keys))
        .map(|(_, reply)| reply.to_string())
        .unwrap_or_else(|| LOCAL_DEFAULT_REPLY.to_string())
}

/// Suggested questions for a page context; unknown contexts get the default list.
pub fn default_suggestions(context: &str) -> &'static [&'static str] {
    match context {
        "home" => &[
            "What universities in Pakistan offer Computer Science?",
            "When are admission deadlines for top universities?",
            "What scholarships are available for engineering students?",
            "How does the application process work?",
        ],
        "university" => &[
            "What are the admission requirements?",
            "When is the application deadline?",
            "What scholarships are offered?",
            "Is hostel accommodation available?",
        ],
        "application" => &[
            "What documents do I need for my application?",
            "How can I check my application status?",
            "Can I apply for multiple programs?",
            "What happens after I submit my application?",
        ],
        "profile" => &[
            "How can I update my profile information?",
            "How is my data used?",
            "Can I link my profile to universities?",
            "How to set notification preferences?",
        ],
        _ => &[
            "Tell me about university admissions in Pakistan",
            "What services does ScrapeMyUni offer?",
            "How can I compare different universities?",
            "How accurate is the information on this website?",
        ],
    }
}
