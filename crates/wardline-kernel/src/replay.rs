//! Rebuilds where a caller is from nothing but the replayed input history.
//!
//! The gateway resends every answer on every callback, so the position is a
//! pure fold over the tokens: no session table, no clock, no I/O. Index 0 is
//! the language selector, index 1 picks a main-menu flow and every later token
//! answers the current step of that flow.

use wardline_contracts::{CallerClass, Language, ListItem};

use crate::drafts::{BursaryDraft, CommitRequest, IssueDraft, RegistrationDraft};
use crate::flows::{self, Flow, FlowId, ListingKind, StepContext, REGISTRY};
use crate::render::{truncate, Reply, PREFIX_CHARS};
use crate::text::{text, Text};
use crate::tokens::TokenSequence;
use crate::validate::Rejection;

/// Everything outside the token history that shapes a reply.
#[derive(Debug, Clone, Copy)]
pub struct EngineContext<'a> {
    pub language: Language,
    pub caller: CallerClass,
    pub gate_unverified: bool,
    pub ward_name: &'a str,
    pub locations: &'a [String],
    pub country_code: &'a str,
    pub announcements: &'a [ListItem],
    pub projects: &'a [ListItem],
    pub page_budget: usize,
}

impl<'a> EngineContext<'a> {
    fn listing(&self, kind: Option<ListingKind>) -> &'a [ListItem] {
        match kind {
            Some(ListingKind::Announcements) => self.announcements,
            Some(ListingKind::Projects) => self.projects,
            None => &[],
        }
    }

    fn step_context(&self, flow: &Flow) -> StepContext<'a> {
        StepContext {
            language: self.language,
            locations: self.locations,
            listing: self.listing(flow.listing),
            country_code: self.country_code,
        }
    }

    fn hides(&self, flow: &Flow) -> bool {
        self.gate_unverified && flow.needs_verification && self.caller != CallerClass::Verified
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    LanguageSelect,
    MainMenu {
        notice: Option<Text>,
    },
    AtStep {
        flow: FlowId,
        index: usize,
        values: Vec<String>,
        /// Why the newest answer was refused, if it was.
        rejection: Option<Rejection>,
    },
    Completed {
        flow: FlowId,
        values: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reply(Reply),
    Commit(CommitRequest),
}

/// Positions after 0, 1, ..., depth tokens. A shorter history always yields a
/// prefix of a longer one's trail.
pub fn trail(tokens: &TokenSequence, ctx: &EngineContext<'_>) -> Vec<Position> {
    let mut positions = Vec::with_capacity(tokens.depth() + 1);
    let mut current = Position::LanguageSelect;
    positions.push(current.clone());
    for token in tokens.as_slice() {
        current = advance(current, token, ctx);
        positions.push(current.clone());
    }
    positions
}

pub fn locate(tokens: &TokenSequence, ctx: &EngineContext<'_>) -> Position {
    tokens
        .as_slice()
        .iter()
        .fold(Position::LanguageSelect, |position, token| {
            advance(position, token, ctx)
        })
}

pub fn evaluate(tokens: &TokenSequence, ctx: &EngineContext<'_>) -> Outcome {
    outcome_for(&locate(tokens, ctx), ctx)
}

/// Whether the caller's registration status can change the outcome: the
/// reply is the main menu, or a gated flow gets selected along the way.
pub fn needs_caller(tokens: &TokenSequence, ctx: &EngineContext<'_>) -> bool {
    let open = EngineContext {
        caller: CallerClass::Verified,
        ..*ctx
    };
    let path = trail(tokens, &open);
    let selects_gated = ctx.gate_unverified
        && path.windows(2).any(|pair| match pair {
            [Position::MainMenu { .. }, Position::AtStep { flow, .. }] => {
                flows::by_id(*flow).needs_verification
            }
            _ => false,
        });
    selects_gated || matches!(path.last(), Some(Position::MainMenu { .. }))
}

fn advance(position: Position, token: &str, ctx: &EngineContext<'_>) -> Position {
    match position {
        Position::LanguageSelect => Position::MainMenu { notice: None },
        Position::MainMenu { .. } => match flows::by_selector(token) {
            None => Position::MainMenu {
                notice: Some(Text::InvalidChoice),
            },
            Some(flow) if ctx.hides(flow) => Position::MainMenu {
                notice: Some(Text::VerificationRequired),
            },
            Some(flow) if flow.steps.is_empty() => Position::Completed {
                flow: flow.id,
                values: Vec::new(),
            },
            Some(flow) => Position::AtStep {
                flow: flow.id,
                index: 0,
                values: Vec::new(),
                rejection: None,
            },
        },
        Position::AtStep {
            flow,
            index,
            mut values,
            ..
        } => {
            let def = flows::by_id(flow);
            let step = &def.steps[index];
            if token.trim() == "0" && !step.skippable {
                return Position::MainMenu { notice: None };
            }
            match (step.validate)(token, &ctx.step_context(def)) {
                Ok(value) => {
                    values.push(value);
                    if def.is_terminal(index) {
                        Position::Completed { flow, values }
                    } else {
                        Position::AtStep {
                            flow,
                            index: index + 1,
                            values,
                            rejection: None,
                        }
                    }
                }
                Err(rejection) => Position::AtStep {
                    flow,
                    index,
                    values,
                    rejection: Some(rejection),
                },
            }
        }
        done @ Position::Completed { .. } => done,
    }
}

fn outcome_for(position: &Position, ctx: &EngineContext<'_>) -> Outcome {
    let reply = match position {
        Position::LanguageSelect => language_screen(ctx),
        Position::MainMenu { notice } => main_menu(ctx, *notice),
        Position::AtStep {
            flow,
            index,
            values,
            rejection,
        } => step_prompt(flows::by_id(*flow), *index, values, *rejection, ctx),
        Position::Completed { flow, values } => return completion(*flow, values, ctx),
    };
    Outcome::Reply(reply.fit(ctx.page_budget))
}

pub fn language_screen(ctx: &EngineContext<'_>) -> Reply {
    let heading = text(ctx.language, Text::FreeService).replace("{ward}", ctx.ward_name);
    Reply::con(format!(
        "{heading}\n\n{}\n1. English\n2. Kiswahili\n3. Kikamba",
        text(ctx.language, Text::SelectLanguage)
    ))
}

pub fn main_menu(ctx: &EngineContext<'_>, notice: Option<Text>) -> Reply {
    let mut lines: Vec<String> = Vec::new();
    match ctx.caller {
        CallerClass::Pending => lines.push(text(ctx.language, Text::BannerPending).to_string()),
        CallerClass::Rejected => lines.push(text(ctx.language, Text::BannerRejected).to_string()),
        CallerClass::Unregistered | CallerClass::Verified => {}
    }
    if let Some(key) = notice {
        lines.push(text(ctx.language, key).to_string());
    }
    lines.push(text(ctx.language, Text::MainMenu).to_string());
    for flow in REGISTRY.iter().filter(|f| !ctx.hides(f)) {
        lines.push(format!("{}. {}", flow.selector, text(ctx.language, flow.label)));
    }
    Reply::con(lines.join("\n"))
}

fn step_prompt(
    flow: &Flow,
    index: usize,
    values: &[String],
    rejection: Option<Rejection>,
    ctx: &EngineContext<'_>,
) -> Reply {
    let step_ctx = ctx.step_context(flow);
    if flow.listing.is_some() && step_ctx.listing.is_empty() {
        let key = match flow.listing {
            Some(ListingKind::Projects) => Text::NoProjects,
            _ => Text::NoNews,
        };
        return Reply::end(text(ctx.language, key));
    }

    let step = &flow.steps[index];
    let mut head = String::new();
    if let Some(Rejection(key)) = rejection {
        head.push_str(text(ctx.language, key));
        head.push('\n');
    }
    head.push_str(&step.prompt.build(&step_ctx, values));

    // The footer carries the way out of the step, so only the head is cut.
    let footer = step.footer.map(|key| text(ctx.language, key));
    let reserved = footer.map_or(0, |f| f.chars().count() + 1);
    let mut out = truncate(&head, ctx.page_budget.saturating_sub(PREFIX_CHARS + reserved));
    if let Some(footer) = footer {
        out.push('\n');
        out.push_str(footer);
    }
    Reply::con(out)
}

fn completion(flow: FlowId, values: &[String], ctx: &EngineContext<'_>) -> Outcome {
    let request = match flow {
        FlowId::Register => RegistrationDraft::from_values(values).map(CommitRequest::Register),
        FlowId::ReportIssue => IssueDraft::from_values(values).map(CommitRequest::ReportIssue),
        FlowId::ApplyBursary => BursaryDraft::from_values(values).map(CommitRequest::ApplyBursary),
        FlowId::ViewNews | FlowId::ViewProjects => {
            let listing = ctx.listing(flows::by_id(flow).listing);
            let item = values
                .first()
                .and_then(|v| v.parse::<usize>().ok())
                .and_then(|i| listing.get(i));
            let reply = match item {
                Some(item) => Reply::end(format!("{}\n{}", item.title, item.detail)),
                None => Reply::end(text(ctx.language, Text::InvalidChoice)),
            };
            return Outcome::Reply(reply.fit(ctx.page_budget));
        }
        FlowId::Exit => return Outcome::Reply(Reply::end(text(ctx.language, Text::Goodbye))),
    };
    match request {
        Some(request) => Outcome::Commit(request),
        None => Outcome::Reply(Reply::end(text(ctx.language, Text::ServiceUnavailable))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ReplyKind;
    use crate::tokens::parse;

    fn locations() -> Vec<String> {
        vec!["Kyamatu".to_string(), "Nzeluni".to_string(), "Mbitini".to_string()]
    }

    fn news() -> Vec<ListItem> {
        vec![
            ListItem {
                title: "Ward meeting Fri 2pm".to_string(),
                detail: "All residents are invited to the chief's camp. ".repeat(10),
            },
            ListItem {
                title: "Bursary portal open".to_string(),
                detail: "Applications close on the 30th.".to_string(),
            },
        ]
    }

    fn ctx<'a>(locations: &'a [String], news: &'a [ListItem]) -> EngineContext<'a> {
        EngineContext {
            language: Language::En,
            caller: CallerClass::Unregistered,
            gate_unverified: false,
            ward_name: "KYAMATU WARD",
            locations,
            country_code: "254",
            announcements: news,
            projects: &[],
            page_budget: 182,
        }
    }

    fn reply(outcome: Outcome) -> Reply {
        match outcome {
            Outcome::Reply(reply) => reply,
            Outcome::Commit(request) => panic!("unexpected commit: {request:?}"),
        }
    }

    #[test]
    fn fresh_session_offers_three_languages() {
        let (l, n) = (locations(), news());
        let r = reply(evaluate(&parse(""), &ctx(&l, &n)));
        assert_eq!(r.kind, ReplyKind::Continue);
        let options = r
            .text
            .lines()
            .filter(|line| line.starts_with(|c: char| c.is_ascii_digit()))
            .count();
        assert_eq!(options, 3);
    }

    #[test]
    fn language_pick_shows_main_menu() {
        let (l, n) = (locations(), news());
        let r = reply(evaluate(&parse("1"), &ctx(&l, &n)));
        assert!(r.text.starts_with("Main Menu:"));
        assert!(r.text.contains("3. Apply Bursary"));
        assert!(r.text.ends_with("0. Exit"));
    }

    #[test]
    fn unknown_selector_falls_back_to_menu() {
        let (l, n) = (locations(), news());
        let r = reply(evaluate(&parse("1*9"), &ctx(&l, &n)));
        assert_eq!(r.kind, ReplyKind::Continue);
        assert!(r.text.starts_with("Invalid choice. Try again.\nMain Menu:"));
    }

    #[test]
    fn evaluation_is_deterministic() {
        let (l, n) = (locations(), news());
        let c = ctx(&l, &n);
        for raw in ["", "1", "1*2*1", "1*3*1*Jane Mutheu*abc", "2*1*Mary Mwende Kioko"] {
            assert_eq!(evaluate(&parse(raw), &c), evaluate(&parse(raw), &c));
        }
    }

    #[test]
    fn shorter_history_is_prefix_of_step_path() {
        let (l, n) = (locations(), news());
        let c = ctx(&l, &n);
        let short = trail(&parse("1*2"), &c);
        let long = trail(&parse("1*2*3"), &c);
        assert_eq!(short.len(), 3);
        assert_eq!(long.len(), 4);
        assert_eq!(&long[..short.len()], &short[..]);
    }

    #[test]
    fn report_issue_scenario_requests_commit() {
        let (l, n) = (locations(), news());
        let outcome = evaluate(&parse("1*2*1*Water*Burst pipe near market*0"), &ctx(&l, &n));
        match outcome {
            Outcome::Commit(CommitRequest::ReportIssue(draft)) => {
                assert_eq!(draft.category, "Roads & Infrastructure");
                assert_eq!(draft.title, "Water");
                assert_eq!(draft.description, "Burst pipe near market");
                assert_eq!(draft.location, None);
            }
            other => panic!("expected issue commit, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_amount_reprompts_same_step() {
        let (l, n) = (locations(), news());
        let c = ctx(&l, &n);
        let before = locate(&parse("1*3*1*Jane Mutheu*Mbitini Sec*ADM123"), &c);
        let after = locate(&parse("1*3*1*Jane Mutheu*Mbitini Sec*ADM123*abc"), &c);
        let index_of = |p: &Position| match p {
            Position::AtStep { index, .. } => *index,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(index_of(&before), index_of(&after));

        let r = reply(evaluate(&parse("1*3*1*Jane Mutheu*Mbitini Sec*ADM123*abc"), &c));
        assert_eq!(r.kind, ReplyKind::Continue);
        assert!(r.text.starts_with("Invalid amount."));
        assert!(r.text.contains("Enter amount needed (KSh):"));
    }

    #[test]
    fn long_bursary_summary_keeps_confirm_options() {
        let (l, n) = (locations(), news());
        let c = ctx(&l, &n);
        let name = format!("Jane {}", "Mutheu".repeat(9));
        let school = format!("St {} Girls Secondary", "Ndolo".repeat(7));
        for prefix in ["", "abc*"] {
            let raw = format!("1*3*2*{name}*{school}*ADM123*15000*1*0722000111*{prefix}");
            let r = reply(evaluate(&parse(&raw), &c));
            assert_eq!(r.kind, ReplyKind::Continue);
            assert!(r.body().chars().count() <= 182, "{}", r.body());
            assert!(r.text.ends_with("1. Confirm\n0. Cancel"), "{}", r.text);
        }
    }

    #[test]
    fn rejected_answer_is_skipped_on_later_replays() {
        let (l, n) = (locations(), news());
        let c = ctx(&l, &n);
        let r = reply(evaluate(
            &parse("1*3*1*Jane Mutheu*Mbitini Sec*ADM123*abc*15000"),
            &c,
        ));
        assert!(r.text.starts_with("Household status:"));
    }

    #[test]
    fn zero_goes_back_to_main_menu() {
        let (l, n) = (locations(), news());
        let c = ctx(&l, &n);
        for raw in ["1*1*0", "1*2*1*0", "1*3*1*Jane Mutheu*0", "1*1*Mary Mwende Kioko*0"] {
            let r = reply(evaluate(&parse(raw), &c));
            assert_eq!(r.kind, ReplyKind::Continue, "{raw}");
            assert!(r.text.starts_with("Main Menu:"), "{raw}: {}", r.text);
        }
    }

    #[test]
    fn back_then_new_selection_enters_that_flow() {
        let (l, n) = (locations(), news());
        let r = reply(evaluate(&parse("1*1*0*2"), &ctx(&l, &n)));
        assert!(r.text.starts_with("Select issue category:"));
    }

    #[test]
    fn registration_completes_with_draft() {
        let (l, n) = (locations(), news());
        let outcome = evaluate(
            &parse("1*1*Mary Mwende Kioko*12345678*2*Kwa Ndolo"),
            &ctx(&l, &n),
        );
        assert_eq!(
            outcome,
            Outcome::Commit(CommitRequest::Register(RegistrationDraft {
                full_name: "Mary Mwende Kioko".to_string(),
                national_id: "12345678".to_string(),
                location: "Nzeluni".to_string(),
                village: "Kwa Ndolo".to_string(),
            }))
        );
    }

    #[test]
    fn swahili_prompts_follow_language_context() {
        let (l, n) = (locations(), news());
        let mut c = ctx(&l, &n);
        c.language = Language::Sw;
        let r = reply(evaluate(&parse("2*2"), &c));
        assert!(r.text.starts_with("Chagua aina ya tatizo:"));
    }

    #[test]
    fn caller_is_needed_only_where_status_shows() {
        let (l, n) = (locations(), news());
        let mut c = ctx(&l, &n);
        for raw in ["1", "1*9", "1*1*0"] {
            assert!(needs_caller(&parse(raw), &c), "{raw}");
        }
        for raw in ["", "1*1", "1*1*Mary Mwende Kioko", "1*2*1*Water", "1*0"] {
            assert!(!needs_caller(&parse(raw), &c), "{raw}");
        }
        c.gate_unverified = true;
        assert!(needs_caller(&parse("1*2*1*Water"), &c));
        assert!(!needs_caller(&parse("1*1*Mary Mwende Kioko"), &c));
    }

    #[test]
    fn news_item_is_truncated_not_paginated() {
        let (l, n) = (locations(), news());
        let r = reply(evaluate(&parse("1*4*1"), &ctx(&l, &n)));
        assert!(r.is_end());
        assert!(r.body().chars().count() <= 182);
        assert!(r.text.ends_with(crate::render::ELLIPSIS));
    }

    #[test]
    fn empty_projects_end_the_session() {
        let (l, n) = (locations(), news());
        let r = reply(evaluate(&parse("1*5"), &ctx(&l, &n)));
        assert!(r.is_end());
        assert_eq!(r.text, "No projects to show.");
    }

    #[test]
    fn exit_says_goodbye() {
        let (l, n) = (locations(), news());
        let r = reply(evaluate(&parse("1*0"), &ctx(&l, &n)));
        assert_eq!(r, Reply::end("Thank you. Goodbye."));
    }

    #[test]
    fn banners_depend_on_caller_class() {
        let (l, n) = (locations(), news());
        let mut c = ctx(&l, &n);
        c.caller = CallerClass::Pending;
        assert!(main_menu(&c, None).text.starts_with("⏳ Pending Verification\n"));
        c.caller = CallerClass::Rejected;
        assert!(main_menu(&c, None).text.starts_with("❌ REJECTED\n"));
        c.caller = CallerClass::Verified;
        assert!(main_menu(&c, None).text.starts_with("Main Menu:"));
    }

    #[test]
    fn unverified_callers_keep_full_menu_unless_gated() {
        let (l, n) = (locations(), news());
        let mut c = ctx(&l, &n);
        c.caller = CallerClass::Pending;
        assert!(main_menu(&c, None).text.contains("2. Report Issue"));

        c.gate_unverified = true;
        let menu = main_menu(&c, None).text;
        assert!(!menu.contains("2. Report Issue"));
        assert!(!menu.contains("3. Apply Bursary"));
        let r = reply(evaluate(&parse("1*2"), &c));
        assert!(r.text.contains("Available once your registration is verified."));
    }
}
