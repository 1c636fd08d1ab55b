//! Game page extraction.
//!
//! Turns one `showgame.php` HTML page into a [`GameRecord`], or into a
//! [`MissingGame`] when the page reports that the id does not exist.
//! Extraction never fails: any element that is absent yields a sentinel
//! string or an empty sequence.
//!
//! The page is walked once in document order. Elements are indexed by `id`
//! (first occurrence wins) and the class-tagged cells are collected on the
//! way, so the order of categories and responses is the page order.

use chrono::NaiveDate;
use scraper::{ElementRef, Html};
use std::collections::HashMap;

use crate::models::{CorpusEntry, FinalRound, GameRecord, MissingGame, Round};

pub const TITLE_NOT_FOUND: &str = "Title not found";
pub const COMMENTS_NOT_FOUND: &str = "Comments not found";
pub const FINAL_CLUE_NOT_FOUND: &str = "Final Jeopardy clue not found";
pub const FINAL_RESPONSE_NOT_FOUND: &str = "Final Jeopardy response not found";

/// Board dimensions of the two main rounds.
pub const COLUMNS: u32 = 6;
pub const ROWS: u32 = 5;

/// Everything the extractor needs from one page, gathered in a single walk.
#[derive(Default)]
struct PageIndex<'a> {
    by_id: HashMap<&'a str, ElementRef<'a>>,
    has_error: bool,
    categories: Vec<String>,
    category_comments: Vec<String>,
    responses: Vec<String>,
}

impl<'a> PageIndex<'a> {
    fn build(document: &'a Html) -> Self {
        let mut index = PageIndex::default();

        for element in document.root_element().descendants().filter_map(ElementRef::wrap) {
            let value = element.value();

            if let Some(id) = value.id() {
                index.by_id.entry(id).or_insert(element);
            }

            let has_class = |class: &str| value.classes().any(|c| c == class);
            match value.name() {
                "p" if has_class("error") => index.has_error = true,
                "td" if has_class("category_name") => index.categories.push(text_of(element)),
                "td" if has_class("category_comments") => {
                    index.category_comments.push(text_of(element))
                }
                "em" if has_class("correct_response") => index.responses.push(text_of(element)),
                _ => {}
            }
        }

        index
    }

    fn text_by_id(&self, id: &str) -> Option<String> {
        self.by_id.get(id).map(|el| text_of(*el))
    }
}

/// All descendant text of an element, concatenated as-is and trimmed once
/// at the ends.
///
/// Whitespace between text nodes is kept, so `This <a>painter</a> drew`
/// reads `This painter drew`. Stripping each node before joining would give
/// `Thispainterdrew`; corpora produced that way differ on such clues.
fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Extract one game page.
pub fn extract_game(body: &str, game_id: u32) -> CorpusEntry {
    let document = Html::parse_document(body);
    let index = PageIndex::build(&document);

    if index.has_error {
        tracing::debug!(game_id, "upstream reports no such game");
        return MissingGame::new(game_id, format!("No game {} in database", game_id)).into();
    }

    let game_title = index
        .text_by_id("game_title")
        .unwrap_or_else(|| TITLE_NOT_FOUND.to_string());
    let game_date = parse_title_date(&game_title);
    if game_date.is_none() {
        tracing::warn!(game_id, title = %game_title, "could not parse a date from the game title");
    }

    let game_comments = index
        .text_by_id("game_comments")
        .unwrap_or_else(|| COMMENTS_NOT_FOUND.to_string());

    let mut jeopardy_round = Round::default();
    let mut double_jeopardy_round = Round::default();

    // Row-major: J_1_1, J_2_1, ..., J_6_1, J_1_2, ... so that cell indices
    // stay aligned with the page order of the responses.
    for row in 1..=ROWS {
        for col in 1..=COLUMNS {
            collect_clue(&index, &mut jeopardy_round, "J", col, row);
            collect_clue(&index, &mut double_jeopardy_round, "DJ", col, row);
        }
    }

    let mut final_jeopardy = FinalRound {
        clue: index
            .text_by_id("clue_FJ")
            .unwrap_or_else(|| FINAL_CLUE_NOT_FOUND.to_string()),
        response: FINAL_RESPONSE_NOT_FOUND.to_string(),
    };

    assign_responses(
        index.responses,
        &mut jeopardy_round,
        &mut double_jeopardy_round,
        &mut final_jeopardy,
    );

    tracing::debug!(
        game_id,
        jeopardy = jeopardy_round.clues.len(),
        double_jeopardy = double_jeopardy_round.clues.len(),
        "extracted game"
    );

    GameRecord {
        game_id,
        game_title,
        game_date,
        game_comments,
        categories: index.categories,
        category_comments: index.category_comments,
        jeopardy_round,
        double_jeopardy_round,
        final_jeopardy,
    }
    .into()
}

fn collect_clue(index: &PageIndex<'_>, round: &mut Round, prefix: &str, col: u32, row: u32) {
    let cell = format!("{}_{}_{}", prefix, col, row);
    if let Some(text) = index.text_by_id(&format!("clue_{}", cell)) {
        round.clues.push(text);
        round.cells.push(cell);
    }
}

/// Distribute responses over the rounds by position.
///
/// Upstream contract: the page lists every revealed response in board
/// order, all Jeopardy! responses first, then Double Jeopardy!, then the
/// Final. Nothing on the page ties a response to its clue, so this is the
/// only link; a page that breaks the ordering misattributes silently.
fn assign_responses(
    responses: Vec<String>,
    jeopardy: &mut Round,
    double_jeopardy: &mut Round,
    final_jeopardy: &mut FinalRound,
) {
    let j = jeopardy.clues.len();
    let d = double_jeopardy.clues.len();

    for (k, response) in (1..).zip(responses) {
        if k <= j {
            jeopardy.responses.push(response);
        } else if k <= j + d {
            double_jeopardy.responses.push(response);
        } else if k == j + d + 1 {
            final_jeopardy.response = response;
        }
        // Anything past the Final has no slot and is dropped.
    }
}

/// Parse the air date out of a title such as
/// `"Show #1234 - Thursday, September 8, 2011"`.
///
/// Takes the text after the last `"day, "` and reads it as `Month D, YYYY`.
pub fn parse_title_date(title: &str) -> Option<NaiveDate> {
    let tail = title.rsplit("day, ").next()?;
    NaiveDate::parse_from_str(tail, "%B %d, %Y").ok()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a page shaped like the upstream: title, comments, category
    /// row, then the boards with each clue followed by its response.
    pub(crate) struct PageBuilder {
        title: Option<String>,
        j_clues: usize,
        dj_clues: usize,
        final_clue: bool,
        responses: usize,
    }

    impl PageBuilder {
        pub(crate) fn new(title: &str) -> Self {
            Self {
                title: Some(title.to_string()),
                j_clues: 0,
                dj_clues: 0,
                final_clue: false,
                responses: 0,
            }
        }

        pub(crate) fn full_game(title: &str) -> Self {
            Self::new(title).clues(30, 30).final_clue().responses(61)
        }

        pub(crate) fn untitled() -> Self {
            Self {
                title: None,
                ..Self::new("")
            }
        }

        pub(crate) fn clues(mut self, j: usize, dj: usize) -> Self {
            self.j_clues = j;
            self.dj_clues = dj;
            self
        }

        pub(crate) fn final_clue(mut self) -> Self {
            self.final_clue = true;
            self
        }

        pub(crate) fn responses(mut self, n: usize) -> Self {
            self.responses = n;
            self
        }

        pub(crate) fn build(&self) -> String {
            let mut html = String::from("<html><body><div id=\"content\">\n");
            if let Some(title) = &self.title {
                html.push_str(&format!("<div id=\"game_title\"><h1>{}</h1></div>\n", title));
            }
            html.push_str("<div id=\"game_comments\">  Tournament of Champions  </div>\n");

            let mut emitted = 0;
            let mut board = |prefix: &str, count: usize, html: &mut String| {
                html.push_str("<table class=\"round\"><tr>");
                for c in 1..=COLUMNS {
                    html.push_str(&format!(
                        "<td class=\"category_name\">{} CAT {}</td><td class=\"category_comments\"></td>",
                        prefix, c
                    ));
                }
                html.push_str("</tr>\n");
                let mut n = 0;
                for r in 1..=ROWS {
                    html.push_str("<tr>");
                    for c in 1..=COLUMNS {
                        if n < count {
                            html.push_str(&format!(
                                "<td id=\"clue_{p}_{c}_{r}\" class=\"clue_text\">{p} clue {c}/{r}</td>",
                                p = prefix,
                                c = c,
                                r = r
                            ));
                            if emitted < self.responses {
                                emitted += 1;
                                html.push_str(&format!(
                                    "<td style=\"display:none\"><em class=\"correct_response\">response {}</em></td>",
                                    emitted
                                ));
                            }
                            n += 1;
                        }
                    }
                    html.push_str("</tr>\n");
                }
                html.push_str("</table>\n");
            };
            board("J", self.j_clues, &mut html);
            board("DJ", self.dj_clues, &mut html);

            if self.final_clue {
                html.push_str("<table class=\"final_round\"><tr><td class=\"category_name\">FINAL CAT</td></tr>");
                html.push_str("<tr><td id=\"clue_FJ\" class=\"clue_text\">final clue</td></tr></table>\n");
            }
            while emitted < self.responses {
                emitted += 1;
                html.push_str(&format!(
                    "<div><em class=\"correct_response\">response {}</em></div>\n",
                    emitted
                ));
            }
            html.push_str("</div></body></html>");
            html
        }
    }

    fn game(entry: CorpusEntry) -> GameRecord {
        match entry {
            CorpusEntry::Game(g) => g,
            CorpusEntry::Missing(m) => panic!("expected a game, got {:?}", m),
        }
    }

    fn assert_parallel(round: &Round) {
        assert_eq!(round.cells.len(), round.clues.len());
        assert!(round.responses.len() <= round.clues.len());
    }

    #[test]
    fn normal_game() {
        let html = PageBuilder::full_game("Show #1234 - Thursday, September 8, 2011").build();
        let g = game(extract_game(&html, 1234));

        assert_eq!(g.game_id, 1234);
        assert_eq!(g.game_title, "Show #1234 - Thursday, September 8, 2011");
        assert_eq!(g.game_date, NaiveDate::from_ymd_opt(2011, 9, 8));
        assert_eq!(g.game_comments, "Tournament of Champions");
        assert_eq!(g.categories.len(), 13);
        assert_eq!(g.categories[0], "J CAT 1");
        assert_eq!(g.categories[12], "FINAL CAT");
        assert_eq!(g.category_comments.len(), 12);

        for round in [&g.jeopardy_round, &g.double_jeopardy_round] {
            assert_eq!(round.clues.len(), 30);
            assert_eq!(round.responses.len(), 30);
            assert_parallel(round);
        }
        assert_eq!(g.jeopardy_round.responses[0], "response 1");
        assert_eq!(g.double_jeopardy_round.responses[0], "response 31");
        assert_eq!(g.final_jeopardy.clue, "final clue");
        assert_eq!(g.final_jeopardy.response, "response 61");
    }

    #[test]
    fn cells_are_row_major() {
        let html = PageBuilder::full_game("Show #1 - Monday, January 6, 1986").build();
        let g = game(extract_game(&html, 1));

        let cells = &g.jeopardy_round.cells;
        assert_eq!(&cells[..7], ["J_1_1", "J_2_1", "J_3_1", "J_4_1", "J_5_1", "J_6_1", "J_1_2"]);
        assert_eq!(g.double_jeopardy_round.cells[29], "DJ_6_5");
        assert_eq!(g.jeopardy_round.clues[1], "J clue 2/1");

        for cell in cells.iter().chain(&g.double_jeopardy_round.cells) {
            let parts: Vec<&str> = cell.split('_').collect();
            assert_eq!(parts.len(), 3, "{}", cell);
            assert!(parts[0] == "J" || parts[0] == "DJ");
            let c: u32 = parts[1].parse().unwrap();
            let r: u32 = parts[2].parse().unwrap();
            assert!((1..=6).contains(&c) && (1..=5).contains(&r));
        }
    }

    #[test]
    fn missing_page() {
        let html = "<html><body><p class=\"error\">No such game</p></body></html>";
        assert_eq!(
            extract_game(html, 42),
            CorpusEntry::Missing(MissingGame::new(42, "No game 42 in database"))
        );
    }

    #[test]
    fn partial_reveal() {
        let html = PageBuilder::new("Show #5 - Friday, May 5, 2000")
            .clues(30, 0)
            .responses(25)
            .build();
        let g = game(extract_game(&html, 5));

        assert_eq!(g.jeopardy_round.clues.len(), 30);
        assert_eq!(g.jeopardy_round.responses.len(), 25);
        assert_parallel(&g.jeopardy_round);
        assert!(g.double_jeopardy_round.is_empty());
        assert!(g.double_jeopardy_round.responses.is_empty());
        assert_eq!(g.final_jeopardy.clue, FINAL_CLUE_NOT_FOUND);
        assert_eq!(g.final_jeopardy.response, FINAL_RESPONSE_NOT_FOUND);
    }

    #[test]
    fn unparseable_title_gives_null_date() {
        let html = PageBuilder::new("Pilot episode").clues(2, 0).responses(2).build();
        let g = game(extract_game(&html, 9));
        assert_eq!(g.game_title, "Pilot episode");
        assert_eq!(g.game_date, None);
    }

    #[test]
    fn empty_page_yields_sentinels() {
        let g = game(extract_game("<html><body></body></html>", 3));
        assert_eq!(g.game_title, TITLE_NOT_FOUND);
        assert_eq!(g.game_date, None);
        assert_eq!(g.game_comments, COMMENTS_NOT_FOUND);
        assert!(g.categories.is_empty());
        assert!(g.jeopardy_round.is_empty());
        assert!(g.jeopardy_round.cells.is_empty());
        assert!(g.jeopardy_round.responses.is_empty());
        assert_eq!(g.final_jeopardy.clue, FINAL_CLUE_NOT_FOUND);
        assert_eq!(g.final_jeopardy.response, FINAL_RESPONSE_NOT_FOUND);
    }

    #[test]
    fn untitled_page_uses_sentinel() {
        let html = PageBuilder::untitled().clues(1, 1).build();
        let g = game(extract_game(&html, 4));
        assert_eq!(g.game_title, TITLE_NOT_FOUND);
        assert_eq!(g.jeopardy_round.clues.len(), 1);
        assert_eq!(g.double_jeopardy_round.cells, vec!["DJ_1_1".to_string()]);
    }

    #[test]
    fn surplus_responses_are_dropped() {
        let html = PageBuilder::new("Show #8 - Tuesday, March 3, 1998")
            .clues(2, 1)
            .final_clue()
            .responses(6)
            .build();
        let g = game(extract_game(&html, 8));
        assert_eq!(g.jeopardy_round.responses, vec!["response 1", "response 2"]);
        assert_eq!(g.double_jeopardy_round.responses, vec!["response 3"]);
        assert_eq!(g.final_jeopardy.response, "response 4");
    }

    #[test]
    fn nested_markup_text_is_flattened_and_trimmed() {
        let html = r#"<html><body>
            <div id="game_title"> <h1>Show #77 - Wednesday, <b>June 1, 1994</b></h1> </div>
            <table><tr><td id="clue_J_1_1">  This <a href="x">painter</a> drew  </td></tr></table>
            <em class="correct_response"><i>Degas</i></em>
        </body></html>"#;
        let g = game(extract_game(html, 77));
        assert_eq!(g.game_title, "Show #77 - Wednesday, June 1, 1994");
        assert_eq!(g.game_date, NaiveDate::from_ymd_opt(1994, 6, 1));
        assert_eq!(g.jeopardy_round.clues, vec!["This painter drew"]);
        assert_eq!(g.jeopardy_round.responses, vec!["Degas"]);
    }

    #[test]
    fn inner_whitespace_between_nodes_is_kept() {
        let html = r#"<div id="game_comments">
            <b>Tournament</b> of <i>Champions</i>
        </div>"#;
        let g = game(extract_game(html, 5));
        assert_eq!(g.game_comments, "Tournament of Champions");
    }

    #[test]
    fn title_date_parsing() {
        assert_eq!(
            parse_title_date("Show #1234 - Thursday, September 8, 2011"),
            NaiveDate::from_ymd_opt(2011, 9, 8)
        );
        assert_eq!(
            parse_title_date("Show #4 - Monday, December 31, 1984"),
            NaiveDate::from_ymd_opt(1984, 12, 31)
        );
        // The last "day, " wins.
        assert_eq!(
            parse_title_date("Super Tuesday, Day 2 - Friday, April 1, 2005"),
            NaiveDate::from_ymd_opt(2005, 4, 1)
        );
        assert_eq!(parse_title_date("Pilot episode"), None);
        assert_eq!(parse_title_date("Show #9 - Thursday, Smarch 40, 2011"), None);
        assert_eq!(parse_title_date(TITLE_NOT_FOUND), None);
    }
}
