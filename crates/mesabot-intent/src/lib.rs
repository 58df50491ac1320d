// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure intent mapper for the Mesabot conversation.
//!
//! [`map`] turns one raw inbound text into a canonical [`Intent`] given the
//! sender's conversation, mutating the conversation where a matched rule
//! advances the flow. It performs no I/O; the router decides afterwards
//! whether the intent is handled locally or forwarded to the remote
//! dialogue engine.
//!
//! Unmatched input falls into one of two behaviors:
//! - pass-through states (greeting, confirm, id prompts, listing) return
//!   the normalized text verbatim so it can be forwarded, and
//! - pure-menu states (help, category, problem menus) return their own
//!   menu's canonical intent so the menu is shown again instead of leaking
//!   stray digits into free-form dialogue.

pub mod menus;

use mesabot_core::{Category, ConvState, Conversation, Intent};

/// Map one raw inbound text to a canonical intent.
///
/// A finished conversation is fully reset first and the text is returned
/// as a free intent, so the sender starts over cleanly.
pub fn map(raw: &str, conv: &mut Conversation) -> Intent {
    let text = normalize(raw);

    if conv.finished {
        conv.reset();
        return Intent::Free(text);
    }

    match conv.state {
        ConvState::Greeting => map_greeting(&text, conv),
        ConvState::Help => map_help(&text, conv),
        ConvState::AwaitingCategory => map_category(&text, conv),
        ConvState::Subcategory(category) => map_subcategory(category, &text, conv),
        ConvState::ConfirmSend => map_confirm(&text, conv),
        ConvState::AwaitingQueryId => map_query_id(&text),
        ConvState::AwaitingCancelId => map_cancel_id(&text, conv),
        ConvState::AwaitingRating => map_rating(&text),
        ConvState::ListingMenu => map_listing_menu(&text),
        ConvState::Paginating => map_paginating(&text),
    }
}

/// Trim and lowercase. All rule matching runs on the normalized form.
fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn all_digits(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

/// Greeting is the only state with substring leniency, so free-form
/// phrasings like "quiero generar un ticket" still hit the menu.
fn map_greeting(text: &str, conv: &mut Conversation) -> Intent {
    if text == "1" || text.contains("generar") {
        conv.state = ConvState::AwaitingCategory;
        return Intent::Generate;
    }
    if text == "2" || text.contains("consultar") {
        conv.state = ConvState::AwaitingQueryId;
        return Intent::Query;
    }
    if text == "3" || text.contains("cancelar") {
        conv.state = ConvState::AwaitingCancelId;
        return Intent::Cancel;
    }
    if text == "4" || text.contains("ver") {
        return Intent::ListAll;
    }
    if text == "5" || text.contains("ayuda") {
        conv.state = ConvState::Help;
        return Intent::Help;
    }
    Intent::Free(text.to_string())
}

/// Same digits as the greeting menu, except 5 leaves help. Numeric only.
fn map_help(text: &str, conv: &mut Conversation) -> Intent {
    match text {
        "1" => {
            conv.state = ConvState::AwaitingCategory;
            Intent::Generate
        }
        "2" => {
            conv.state = ConvState::AwaitingQueryId;
            Intent::Query
        }
        "3" => {
            conv.state = ConvState::AwaitingCancelId;
            Intent::Cancel
        }
        "4" => Intent::ListAll,
        "5" => {
            conv.state = ConvState::Greeting;
            Intent::BackToMenu
        }
        _ => Intent::Help,
    }
}

fn map_category(text: &str, conv: &mut Conversation) -> Intent {
    for (idx, category) in Category::ALL.iter().enumerate() {
        let digit = (idx + 1).to_string();
        if text == digit {
            conv.state = ConvState::Subcategory(*category);
            return Intent::Free(category.canonical_intent().to_string());
        }
    }
    if text == "6" {
        conv.state = ConvState::Greeting;
        return Intent::BackToMenu;
    }
    // Re-show the category menu.
    Intent::Generate
}

fn map_subcategory(category: Category, text: &str, conv: &mut Conversation) -> Intent {
    let problems = menus::problems(category);
    for (idx, problem) in problems.iter().enumerate() {
        let digit = (idx + 1).to_string();
        if text == digit {
            conv.state = ConvState::ConfirmSend;
            return Intent::Free((*problem).to_string());
        }
    }
    if text == menus::back_digit(category).to_string() {
        conv.state = ConvState::AwaitingCategory;
        return Intent::BackToCategory;
    }
    // Re-show this category's problem menu.
    Intent::Free(category.canonical_intent().to_string())
}

fn map_confirm(text: &str, conv: &mut Conversation) -> Intent {
    if text == "1" || text == "si" {
        return Intent::Confirm;
    }
    if text == "2" || text == "no" {
        conv.reset();
        return Intent::Abort;
    }
    Intent::Free(text.to_string())
}

fn map_query_id(text: &str) -> Intent {
    if all_digits(text)
        && let Ok(id) = text.parse::<u64>()
    {
        return Intent::QueryTicket(id);
    }
    Intent::Free(text.to_string())
}

fn map_cancel_id(text: &str, conv: &mut Conversation) -> Intent {
    if all_digits(text)
        && let Ok(id) = text.parse::<u64>()
    {
        conv.context.ticket_id = Some(id);
        return Intent::CancelTicket(id);
    }
    Intent::Free(text.to_string())
}

fn map_rating(text: &str) -> Intent {
    match text {
        "1" => Intent::Rating(1),
        "2" => Intent::Rating(2),
        "3" => Intent::Rating(3),
        "4" => Intent::Rating(4),
        _ => Intent::InvalidRating,
    }
}

fn map_listing_menu(text: &str) -> Intent {
    match text {
        "1" => Intent::StatusNew,
        "2" => Intent::StatusInProgress,
        "3" => Intent::Exit,
        _ => Intent::Free(text.to_string()),
    }
}

fn map_paginating(text: &str) -> Intent {
    match text {
        "3" => Intent::Exit,
        "4" => Intent::Next,
        "5" => Intent::Previous,
        _ => Intent::Free(text.to_string()),
    }
}
