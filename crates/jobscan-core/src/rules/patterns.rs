//! Common regex patterns for job posting extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Date patterns
    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"\b(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4})\b"
    ).unwrap();

    pub static ref DATE_ISO: Regex = Regex::new(
        r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b"
    ).unwrap();

    pub static ref DATE_MONTH_YEAR: Regex = Regex::new(
        r"(?i)\b(?:(\d{1,2})(?:st|nd|rd|th)?\s+)?(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?(?:\s+(\d{1,2})(?:st|nd|rd|th)?)?,?\s+(\d{4})\b"
    ).unwrap();

    pub static ref DATE_IMMEDIATE: Regex = Regex::new(
        r"(?i)\b(?:immediately|asap|as soon as possible|urgent(?:ly)?)\b"
    ).unwrap();

    pub static ref DATE_WITHIN: Regex = Regex::new(
        r"(?i)\bwithin\s+(\d{1,3})\s+(days?|weeks?|months?)\b"
    ).unwrap();

    // Duration patterns
    pub static ref DURATION_EXPERIENCE: Regex = Regex::new(
        r"(?i)\b(\d{1,2})\s*(\+)?\s*(?:(?:-|–|to)\s*(\d{1,2})\s*(\+)?\s*)?(years?|yrs?|months?)\s*(?:of\s+)?(?:relevant\s+|professional\s+|working\s+|work\s+)?(?:experience|exp)\b"
    ).unwrap();

    pub static ref DURATION_EXPERIENCE_VI: Regex = Regex::new(
        r"(?i)\b(\d{1,2})\s*(\+)?\s*(?:(?:-|–|đến)\s*(\d{1,2})\s*(\+)?\s*)?(năm|tháng)\s+kinh\s+nghiệm\b"
    ).unwrap();

    pub static ref DURATION_CONTRACT: Regex = Regex::new(
        r"(?i)\b(\d{1,2})[\s\-]*(months?|years?)\s+contract\b|\bcontract\s+(?:of\s+|for\s+)?(\d{1,2})\s*(months?|years?)\b"
    ).unwrap();

    pub static ref DURATION_RANGE: Regex = Regex::new(
        r"(?i)\b(\d{1,2})\s*(?:-|–|to)\s*(\d{1,2})\s*(years?|yrs?|months?|weeks?)\b"
    ).unwrap();

    pub static ref DURATION_PLAIN: Regex = Regex::new(
        r"(?i)\b(\d{1,2})\s*(\+)?\s*(years?|yrs?|months?|weeks?)\b"
    ).unwrap();

    // Contact patterns
    pub static ref EMAIL: Regex = Regex::new(
        r"(?i)\b[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}\b"
    ).unwrap();

    pub static ref URL_SCHEME: Regex = Regex::new(
        r#"(?i)https?://[^\s<>"{}|\\^`\[\]]*[^\s<>"{}|\\^`\[\].,;:!?)]"#
    ).unwrap();

    pub static ref URL_WWW: Regex = Regex::new(
        r#"(?i)\bwww\.[^\s<>"{}|\\^`\[\]]*[^\s<>"{}|\\^`\[\].,;:!?)]"#
    ).unwrap();

    pub static ref PHONE_PARENS: Regex = Regex::new(
        r"\(\d{3}\)\s*\d{3}[\-\s]?\d{4}\b"
    ).unwrap();

    pub static ref PHONE_INTERNATIONAL: Regex = Regex::new(
        r"\+\d{1,3}[\-\s]?\d{1,4}[\-\s]?\d{1,4}[\-\s]?\d{1,9}\b"
    ).unwrap();

    pub static ref PHONE_VIETNAMESE: Regex = Regex::new(
        r"\b0\d{9,10}\b"
    ).unwrap();

    pub static ref PHONE_NORTH_AMERICAN: Regex = Regex::new(
        r"\b\d{3}[\-\s]?\d{3}[\-\s]?\d{4}\b"
    ).unwrap();

    // Salary patterns
    pub static ref SALARY_DOLLAR: Regex = Regex::new(
        r"(?i)\$\s?\d+(?:,\d{3})*(?:\.\d+)?(?:\s*k\b)?(?:\s*(?:-|–|to)\s*\$?\s?\d+(?:,\d{3})*(?:\.\d+)?(?:\s*k\b)?)?(?:\s*(?:usd|per\s+(?:year|annum|month|hour)|annually|monthly|hourly|/\s?(?:year|yr|month|mo|hour|hr))\b)?"
    ).unwrap();

    pub static ref SALARY_USD_SUFFIX: Regex = Regex::new(
        r"(?i)\b\d+(?:,\d{3})*(?:\.\d+)?(?:\s*k\b)?(?:\s*(?:-|–|to)\s*\d+(?:,\d{3})*(?:\.\d+)?(?:\s*k\b)?)?\s*(?:usd|dollars?)\b(?:\s*(?:per\s+(?:year|annum|month|hour)|annually|monthly|hourly)\b)?"
    ).unwrap();

    pub static ref SALARY_MILLIONS: Regex = Regex::new(
        r"(?i)\b\d{1,3}(?:[.,]\d+)?(?:\s*(?:-|–|to)\s*\d{1,3}(?:[.,]\d+)?)?\s*(?:triệu|tr|million)\b(?:\s*(?:vnd|vnđ|đồng|usd)\b)?"
    ).unwrap();

    pub static ref SALARY_VND: Regex = Regex::new(
        r"(?i)\b\d+(?:[.,]\d{3})*(?:\s*(?:-|–|to)\s*\d+(?:[.,]\d{3})*)?\s*(?:vnd|vnđ|đồng)\b"
    ).unwrap();

    // Work arrangement patterns
    pub static ref WORK_REMOTE: Regex = Regex::new(
        r"(?i)\b(?:fully\s+)?(?:remote|work[\s\-]from[\s\-]home|wfh|telecommut(?:e|ing)|telework)\b"
    ).unwrap();

    pub static ref WORK_HYBRID: Regex = Regex::new(
        r"(?i)\bhybrid\b"
    ).unwrap();

    pub static ref WORK_ONSITE: Regex = Regex::new(
        r"(?i)\b(?:on[\s\-]?site|in[\s\-]person|in[\s\-]office|office[\s\-]based)\b"
    ).unwrap();

    pub static ref WORK_FULL_TIME: Regex = Regex::new(
        r"(?i)\bfull[\s\-]?time\b"
    ).unwrap();

    pub static ref WORK_PART_TIME: Regex = Regex::new(
        r"(?i)\bpart[\s\-]?time\b"
    ).unwrap();

    pub static ref WORK_CONTRACT: Regex = Regex::new(
        r"(?i)\b(?:contract(?:or)?|freelance|temporary)\b"
    ).unwrap();

    // Education patterns
    pub static ref EDUCATION_DOCTORATE: Regex = Regex::new(
        r"(?i)\b(?:ph\.?d|doctorate|doctoral)(?:\s+degree)?\b"
    ).unwrap();

    pub static ref EDUCATION_MASTER: Regex = Regex::new(
        r"(?i)\b(?:master(?:'s|s)?|mba|msc)(?:\s+degree)?\b"
    ).unwrap();

    pub static ref EDUCATION_BACHELOR: Regex = Regex::new(
        r"(?i)\b(?:bachelor(?:'s|s)?|undergraduate|bsc)(?:\s+degree)?\b"
    ).unwrap();

    pub static ref EDUCATION_ASSOCIATE: Regex = Regex::new(
        r"(?i)\bassociate(?:'s|s)?\s+degree\b"
    ).unwrap();

    pub static ref EDUCATION_HIGH_SCHOOL: Regex = Regex::new(
        r"(?i)\b(?:high\s+school(?:\s+diploma)?|ged)\b"
    ).unwrap();

    // Number parsing
    pub static ref NUMBER: Regex = Regex::new(
        r"\d+"
    ).unwrap();

    pub static ref AMOUNT: Regex = Regex::new(
        r"(?i)(\d[\d.,]*\d|\d)\s*(k\b)?"
    ).unwrap();
}
