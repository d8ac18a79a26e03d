//! Source document parsing: front matter, section splitting, and greedy
//! paragraph chunking into retrieval-sized spans.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use tracing::warn;
use walkdir::WalkDir;

use crate::error::{ChatCoreError, Result};
use crate::models::{Chunk, FrontMatter, Section};
use crate::text::tokenize_document;

pub(crate) const DEFAULT_SECTION_HEADING: &str = "소개";
const MAX_CHUNK_CHARS: usize = 1200;
const MIN_CHUNK_CHARS: usize = 800;
const FRONT_MATTER_OPEN: &str = "---\n";
const FRONT_MATTER_CLOSE: &str = "\n---\n";
const SECTION_HEADING_PREFIX: &str = "## ";

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("paragraph break pattern is a valid literal"));

/// Splits the `key: value` metadata block from the body. The block must be
/// delimited by `---` marker lines; a missing delimiter fails the whole file.
pub fn parse_front_matter(raw: &str) -> Result<(FrontMatter, String)> {
    let rest = raw.strip_prefix(FRONT_MATTER_OPEN).ok_or_else(|| {
        ChatCoreError::InvalidDocument("missing front matter opening delimiter".to_string())
    })?;
    let close = rest.find(FRONT_MATTER_CLOSE).ok_or_else(|| {
        ChatCoreError::InvalidDocument("missing front matter closing delimiter".to_string())
    })?;

    let mut front = FrontMatter::default();
    for line in rest[..close].lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = strip_quotes(value.trim()).to_string();
        match key.trim() {
            "title" => front.title = value,
            "route" => front.route = value,
            "category" => front.category = value,
            _ => {}
        }
    }

    let body = rest[close + FRONT_MATTER_CLOSE.len()..].trim().to_string();
    Ok((front, body))
}

fn strip_quotes(value: &str) -> &str {
    let value = value
        .strip_prefix('"')
        .or_else(|| value.strip_prefix('\''))
        .unwrap_or(value);
    value
        .strip_suffix('"')
        .or_else(|| value.strip_suffix('\''))
        .unwrap_or(value)
}

/// Splits a body on level-2 headings. A body with no headings becomes a
/// single default-titled section; text before the first heading is dropped.
#[must_use]
pub fn split_into_sections(body: &str) -> Vec<Section> {
    let mut headings: Vec<(usize, usize, &str)> = Vec::new();
    let mut offset = 0;
    for line in body.split_inclusive('\n') {
        let content = line.trim_end_matches(['\r', '\n']);
        if let Some(rest) = content.strip_prefix(SECTION_HEADING_PREFIX)
            && !rest.trim().is_empty()
        {
            headings.push((offset, offset + line.len(), rest.trim()));
        }
        offset += line.len();
    }

    if headings.is_empty() {
        return vec![Section {
            heading: DEFAULT_SECTION_HEADING.to_string(),
            text: body.to_string(),
        }];
    }

    let mut sections = Vec::with_capacity(headings.len());
    for (index, (_, content_start, heading)) in headings.iter().enumerate() {
        let end = headings.get(index + 1).map_or(body.len(), |next| next.0);
        let text = body[*content_start..end].trim();
        if !text.is_empty() {
            sections.push(Section {
                heading: (*heading).to_string(),
                text: text.to_string(),
            });
        }
    }
    sections
}

/// Greedy paragraph packing. A chunk is flushed once adding the next
/// paragraph would push it past the upper bound, provided it already reached
/// the lower bound; otherwise the paragraph is appended first. The trailing
/// remainder is flushed regardless of size.
#[must_use]
pub fn chunk_section(section: &Section) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in PARAGRAPH_BREAK.split(&section.text) {
        let projected = char_len(&current) + char_len(paragraph);
        if projected < MAX_CHUNK_CHARS {
            append_paragraph(&mut current, paragraph);
        } else if char_len(&current) >= MIN_CHUNK_CHARS {
            chunks.push(std::mem::take(&mut current));
            current = paragraph.to_string();
        } else {
            append_paragraph(&mut current, paragraph);
            chunks.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    if chunks.is_empty() {
        vec![section.text.clone()]
    } else {
        chunks
    }
}

fn append_paragraph(current: &mut String, paragraph: &str) {
    if !current.is_empty() {
        current.push_str("\n\n");
    }
    current.push_str(paragraph);
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Parses one source file into tokenized chunks. Errors are local to the
/// file; the corpus loader decides whether to skip or abort.
pub fn load_document(path: &Path) -> Result<Vec<Chunk>> {
    let raw = fs::read_to_string(path)?;
    let (front, body) = parse_front_matter(&raw)?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");

    let mut chunks = Vec::new();
    for (section_index, section) in split_into_sections(&body).iter().enumerate() {
        for (chunk_index, text) in chunk_section(section).into_iter().enumerate() {
            let tokens = tokenize_document(&format!("{} {}", section.heading, text));
            chunks.push(Chunk {
                id: format!("{stem}-s{section_index}-c{chunk_index}"),
                title: front.title.clone(),
                route: front.route.clone(),
                category: front.category.clone(),
                heading: section.heading.clone(),
                text,
                position: section_index * 1000 + chunk_index,
                tokens,
            });
        }
    }
    Ok(chunks)
}

fn markdown_matcher() -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in ["*.md", "*.markdown"] {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Loads every recognized file directly under `content_dir`, in name order.
/// A file that fails to parse is logged and skipped; loading continues.
pub fn load_chunks(content_dir: &Path) -> Result<Vec<Chunk>> {
    if !content_dir.is_dir() {
        return Err(ChatCoreError::InvalidContentRoot(
            content_dir.display().to_string(),
        ));
    }

    let matcher = markdown_matcher()?;
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(content_dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file() && matcher.is_match(entry.file_name()) {
            files.push(entry.into_path());
        }
    }
    files.sort();

    let mut chunks = Vec::new();
    for path in files {
        match load_document(&path) {
            Ok(mut file_chunks) => chunks.append(&mut file_chunks),
            Err(error) => {
                warn!(file = %path.display(), %error, "skipping document that failed to parse");
            }
        }
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::{
        MAX_CHUNK_CHARS, MIN_CHUNK_CHARS, chunk_section, load_chunks, load_document,
        parse_front_matter, split_into_sections,
    };
    use crate::models::Section;
    use std::fs;

    fn section(text: &str) -> Section {
        Section {
            heading: "시설 안내".to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn front_matter_parses_keys_and_strips_quotes() {
        let raw = "---\ntitle: \"실버케어 요양원\"\nroute: /about\ncategory: 'intro'\n---\n본문입니다.";
        let (front, body) = parse_front_matter(raw).expect("valid front matter");
        assert_eq!(front.title, "실버케어 요양원");
        assert_eq!(front.route, "/about");
        assert_eq!(front.category, "intro");
        assert_eq!(body, "본문입니다.");
    }

    #[test]
    fn front_matter_missing_delimiters_is_a_local_parse_error() {
        assert!(parse_front_matter("no front matter here").is_err());
        assert!(parse_front_matter("---\ntitle: x\nnever closed").is_err());
    }

    #[test]
    fn front_matter_value_containing_colon_keeps_the_remainder() {
        let raw = "---\ntitle: 안내: 입소 절차\n---\n본문";
        let (front, _) = parse_front_matter(raw).expect("valid front matter");
        assert_eq!(front.title, "안내: 입소 절차");
    }

    #[test]
    fn body_without_headings_becomes_one_default_section() {
        let sections = split_into_sections("헤딩 없는 본문입니다.");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "소개");
        assert_eq!(sections[0].text, "헤딩 없는 본문입니다.");
    }

    #[test]
    fn level_two_headings_delimit_sections_and_empty_sections_are_dropped() {
        let body = "## 첫번째\n내용 하나\n\n## 빈섹션\n\n## 두번째\n내용 둘";
        let sections = split_into_sections(body);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].heading, "첫번째");
        assert_eq!(sections[0].text, "내용 하나");
        assert_eq!(sections[1].heading, "두번째");
        assert_eq!(sections[1].text, "내용 둘");
    }

    #[test]
    fn deeper_headings_do_not_start_sections() {
        let body = "## 상위\n### 하위\n내용";
        let sections = split_into_sections(body);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].text, "### 하위\n내용");
    }

    #[test]
    fn chunks_respect_size_bounds_except_trailing_remainder() {
        let paragraph = "가".repeat(300);
        let text = vec![paragraph; 9].join("\n\n");
        let chunks = chunk_section(&section(&text));

        assert!(chunks.len() > 1);
        for chunk in &chunks[..chunks.len() - 1] {
            let len = chunk.chars().count();
            assert!(len <= MAX_CHUNK_CHARS, "chunk over upper bound: {len}");
            assert!(len >= MIN_CHUNK_CHARS, "non-final chunk under lower bound: {len}");
        }
        assert!(chunks.last().is_some_and(|c| !c.is_empty()));
    }

    #[test]
    fn short_section_stays_one_chunk() {
        let chunks = chunk_section(&section("짧은 단락 하나."));
        assert_eq!(chunks, vec!["짧은 단락 하나.".to_string()]);
    }

    #[test]
    fn undersized_accumulator_absorbs_oversized_paragraph_before_flushing() {
        let small = "가".repeat(100);
        let large = "나".repeat(1300);
        let text = format!("{small}\n\n{large}");
        let chunks = chunk_section(&section(&text));

        // 100 + 1300 >= 1200 and the accumulator is under 800, so the big
        // paragraph is appended and the merged chunk flushed oversized.
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chars().count(), 1402);
    }

    #[test]
    fn chunk_ids_and_positions_are_stable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("visit.md");
        fs::write(
            &path,
            "---\ntitle: 면회 안내\nroute: /visit\ncategory: guide\n---\n## 면회 시간\n평일 오후 2시부터 5시까지 면회가 가능합니다.\n\n## 면회 예약\n전화로 사전 예약 후 방문해주세요.",
        )
        .expect("write fixture");

        let chunks = load_document(&path).expect("load document");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].id, "visit-s0-c0");
        assert_eq!(chunks[0].position, 0);
        assert_eq!(chunks[1].id, "visit-s1-c0");
        assert_eq!(chunks[1].position, 1000);
        assert!(chunks[0].has_token("면회"));
    }

    #[test]
    fn corpus_loading_skips_malformed_files_and_keeps_the_rest() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("good.md"),
            "---\ntitle: 좋은 문서\nroute: /good\ncategory: guide\n---\n본문",
        )
        .expect("write good");
        fs::write(dir.path().join("broken.md"), "front matter가 없는 문서").expect("write broken");
        fs::write(dir.path().join("ignored.txt"), "not markdown").expect("write ignored");

        let chunks = load_chunks(dir.path()).expect("load corpus");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].title, "좋은 문서");
    }

    #[test]
    fn missing_content_dir_is_a_hard_error() {
        assert!(load_chunks(std::path::Path::new("/nonexistent/silverchat-content")).is_err());
    }
}
