// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! State reconciliation after a remote-engine reply.
//!
//! The engine reports a session state variable alongside its reply
//! segments. When it names a known node, the local conversation adopts it.
//! When it is missing or unknown, the reply text itself is scanned for
//! recognized prompt fragments; a fragment match means the engine moved the
//! conversation without saying so, which is logged as textual drift.
//!
//! The fragments are part of the wire contract with the engine's flow
//! definitions and with the flow engine's own reply texts; rules in the
//! router match on the same strings.

use tracing::{debug, warn};

use mesabot_core::{ConvState, Conversation};

/// Fragment of the draft confirmation prompt.
pub(crate) const CONFIRM_FRAGMENT: &str = "¿Deseás generar el ticket?";

/// Fragment of the listing status menu.
pub(crate) const STATUS_MENU_FRAGMENT: &str = "Elija el estado de los tickets";

const QUERY_ID_FRAGMENT: &str = "número de ticket que querés consultar";
const CANCEL_ID_FRAGMENT: &str = "número de ticket que querés cancelar";
const CATEGORY_MENU_FRAGMENT: &str = "Seleccioná la categoría";
const RATING_FRAGMENT: &str = "calificá la atención";

/// Ordered fragment table; the first match wins.
const FRAGMENT_STATES: [(&str, ConvState); 6] = [
    (CONFIRM_FRAGMENT, ConvState::ConfirmSend),
    (STATUS_MENU_FRAGMENT, ConvState::ListingMenu),
    (QUERY_ID_FRAGMENT, ConvState::AwaitingQueryId),
    (CANCEL_ID_FRAGMENT, ConvState::AwaitingCancelId),
    (CATEGORY_MENU_FRAGMENT, ConvState::AwaitingCategory),
    (RATING_FRAGMENT, ConvState::AwaitingRating),
];

/// Whether reconciliation determined a state for the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Applied,
    NotApplied,
}

/// Align the local conversation with what the engine reported.
///
/// The state variable is authoritative when it names a known node; an
/// unknown name fails closed and falls through to the fragment scan.
/// Idempotent: the same inputs applied again land on the same state.
pub fn reconcile(
    conv: &mut Conversation,
    state_var: Option<&str>,
    reply_text: &str,
) -> ReconcileOutcome {
    if let Some(node) = state_var.filter(|n| !n.is_empty()) {
        match ConvState::from_node_name(node) {
            Some(state) => {
                if conv.state != state {
                    debug!(from = %conv.state, to = %state, "adopting engine-reported state");
                }
                conv.state = state;
                return ReconcileOutcome::Applied;
            }
            None => {
                warn!(node, "engine reported an unknown node, ignoring it");
            }
        }
    }

    for (fragment, state) in FRAGMENT_STATES {
        if reply_text.contains(fragment) {
            if conv.state != state {
                warn!(from = %conv.state, to = %state, fragment, "textual drift, adopting state from reply fragment");
            }
            conv.state = state;
            return ReconcileOutcome::Applied;
        }
    }

    ReconcileOutcome::NotApplied
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conv() -> Conversation {
        Conversation::new()
    }

    #[test]
    fn known_state_variable_is_adopted() {
        let mut conv = conv();
        let outcome = reconcile(&mut conv, Some("esperando_id_consulta"), "cualquier texto");
        assert_eq!(outcome, ReconcileOutcome::Applied);
        assert_eq!(conv.state, ConvState::AwaitingQueryId);
    }

    #[test]
    fn state_variable_outranks_the_fragment_scan() {
        let mut conv = conv();
        // The text names the status menu but the variable says confirm.
        let outcome = reconcile(
            &mut conv,
            Some("nodo_confirmar_envio"),
            "📋 Elija el estado de los tickets que desea ver:",
        );
        assert_eq!(outcome, ReconcileOutcome::Applied);
        assert_eq!(conv.state, ConvState::ConfirmSend);
    }

    #[test]
    fn unknown_state_variable_falls_through_to_fragments() {
        let mut conv = conv();
        let outcome = reconcile(
            &mut conv,
            Some("nodo_que_ya_no_existe"),
            "Resumen\n\n¿Deseás generar el ticket? (si/no)",
        );
        assert_eq!(outcome, ReconcileOutcome::Applied);
        assert_eq!(conv.state, ConvState::ConfirmSend);
    }

    #[test]
    fn unknown_state_variable_without_fragments_leaves_state() {
        let mut conv = conv();
        conv.state = ConvState::AwaitingCategory;
        let outcome = reconcile(&mut conv, Some("otro_nodo"), "texto libre sin pistas");
        assert_eq!(outcome, ReconcileOutcome::NotApplied);
        assert_eq!(conv.state, ConvState::AwaitingCategory);
    }

    #[test]
    fn each_fragment_maps_to_its_state() {
        let cases = [
            ("¿Deseás generar el ticket? (si/no)", ConvState::ConfirmSend),
            (
                "📋 Elija el estado de los tickets que desea ver:",
                ConvState::ListingMenu,
            ),
            (
                "🔍 Por favor, ingresá el número de ticket que querés consultar:",
                ConvState::AwaitingQueryId,
            ),
            (
                "Ingresá el número de ticket que querés cancelar:",
                ConvState::AwaitingCancelId,
            ),
            (
                "Seleccioná la categoría del problema:",
                ConvState::AwaitingCategory,
            ),
            (
                "📝 Por favor, calificá la atención:",
                ConvState::AwaitingRating,
            ),
        ];
        for (text, expected) in cases {
            let mut conv = conv();
            let outcome = reconcile(&mut conv, None, text);
            assert_eq!(outcome, ReconcileOutcome::Applied, "text {text:?}");
            assert_eq!(conv.state, expected, "text {text:?}");
        }
    }

    #[test]
    fn first_fragment_wins_when_a_reply_carries_two() {
        let mut conv = conv();
        let text = "¿Deseás generar el ticket?\nLuego podrás Elija el estado de los tickets";
        reconcile(&mut conv, None, text);
        assert_eq!(conv.state, ConvState::ConfirmSend);
    }

    #[test]
    fn unrecognized_text_is_not_applied() {
        let mut conv = conv();
        conv.state = ConvState::Help;
        let outcome = reconcile(&mut conv, None, "¡Hola! ¿En qué puedo ayudarte?");
        assert_eq!(outcome, ReconcileOutcome::NotApplied);
        assert_eq!(conv.state, ConvState::Help);
    }

    #[test]
    fn empty_state_variable_is_treated_as_absent() {
        let mut conv = conv();
        let outcome = reconcile(&mut conv, Some(""), "¿Deseás generar el ticket?");
        assert_eq!(outcome, ReconcileOutcome::Applied);
        assert_eq!(conv.state, ConvState::ConfirmSend);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let mut conv = conv();
        reconcile(&mut conv, Some("mostrando_tickets"), "");
        let after_first = conv.clone();
        let outcome = reconcile(&mut conv, Some("mostrando_tickets"), "");
        assert_eq!(outcome, ReconcileOutcome::Applied);
        assert_eq!(conv, after_first);

        let mut conv = after_first;
        reconcile(&mut conv, None, "¿Deseás generar el ticket?");
        let after_fragment = conv.clone();
        reconcile(&mut conv, None, "¿Deseás generar el ticket?");
        assert_eq!(conv, after_fragment);
    }
}
