// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end conversation scenarios over the full assistant stack.
//!
//! Each test drives the running router through a complete sender
//! conversation: scripted dialogue-engine replies stand in for Botpress,
//! the in-memory helpdesk for Redmine. Assertions cover the delivered
//! replies, the backend effects and the durable records, not internal
//! routing steps.

use std::time::Duration;

use mesabot_core::ConvState;
use mesabot_core::types::{Contact, DialogueReply, IssuePage, StatusFilter, Technician, Ticket};
use mesabot_test_utils::TestHarness;
use mesabot_test_utils::mock_helpdesk::make_ticket;

const SENDER: &str = "5491123456789";

/// Typical first reply of the remote engine: the main menu.
const GREETING_MENU: &str = "¡Hola! Soy Mesabot 🤖, el asistente de la mesa de ayuda.\n\
     ¿Qué querés hacer?\n\
     1️⃣ Generar un ticket\n\
     2️⃣ Consultar un ticket\n\
     3️⃣ Cancelar un ticket\n\
     4️⃣ Ver todos mis tickets\n\
     5️⃣ Ayuda";

const QUERY_ID_PROMPT: &str = "🔎 Ingresá el número de ticket que querés consultar:";

const CATEGORY_MENU: &str = "📂 Seleccioná la categoría del problema:\n\
     1️⃣ Impresora\n\
     2️⃣ PC\n\
     3️⃣ Teléfono IP\n\
     4️⃣ Internet\n\
     5️⃣ Videoconferencia\n\
     6️⃣ Volver al menú";

const PC_PROBLEM_MENU: &str = "💻 Indicá el problema con la PC:\n\
     1️⃣ La PC no enciende\n\
     2️⃣ La PC está lenta\n\
     3️⃣ No puedo iniciar sesión\n\
     4️⃣ Pantalla azul\n\
     5️⃣ Falta un programa\n\
     6️⃣ Otro\n\
     7️⃣ Volver";

const DRAFT_SUMMARY: &str = "📝 Resumen del ticket:\n\
     🖊️ Asunto: La PC no enciende\n\
     📂 Categoría: PC\n\n\
     ¿Deseás generar el ticket? (si/no)";

/// A confirmation question whose summary lost the draft markers.
const SUMMARY_WITHOUT_MARKERS: &str =
    "📝 Estás por generar un ticket por: impresora que no imprime.\n\n\
     ¿Deseás generar el ticket? (si/no)";

fn reply(text: &str) -> DialogueReply {
    DialogueReply {
        segments: vec![text.to_string()],
        state: None,
        category: None,
    }
}

fn mine(id: u64, subject: &str, status: &str) -> Ticket {
    let mut ticket = make_ticket(id, subject, status);
    ticket.contact_phone = Some(SENDER.to_string());
    ticket
}

#[tokio::test]
async fn concurrent_first_messages_greet_exactly_once() {
    let harness = TestHarness::builder()
        .with_dialogue_replies(vec![reply(GREETING_MENU), reply(GREETING_MENU)])
        .build()
        .await
        .unwrap();

    // Slow the engine down so the duplicate lands mid-greeting.
    harness
        .dialogue
        .set_delay(Some(Duration::from_millis(150)))
        .await;

    harness.send(SENDER, "hola").await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    harness.send(SENDER, "hola hola?").await;

    assert!(harness.wait_for_replies(1).await);
    // Give a wrongly-queued duplicate time to surface.
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(harness.transport.sent_count().await, 1);
    assert_eq!(harness.dialogue.call_count().await, 1);

    let conv = harness.sessions.snapshot(SENDER).await;
    assert!(conv.context.greeting_sent);
    assert!(!conv.context.greeting_in_progress);

    harness.shutdown().await.unwrap();
}

#[tokio::test]
async fn query_by_id_replies_with_details_and_awaits_a_rating() {
    let harness = TestHarness::builder()
        .with_dialogue_replies(vec![reply(GREETING_MENU), reply(QUERY_ID_PROMPT)])
        .build()
        .await
        .unwrap();
    harness
        .helpdesk
        .add_ticket(make_ticket(482, "Impresora no imprime", "Nueva"))
        .await;

    harness.send(SENDER, "hola").await;
    assert!(harness.wait_for_replies(1).await);

    harness.send(SENDER, "2").await;
    assert!(harness.wait_for_replies(2).await);

    harness.send(SENDER, "482").await;
    assert!(harness.wait_for_replies(3).await);

    let last = harness.last_reply().await.unwrap();
    assert!(last.starts_with("📋 Detalles del ticket #482:"));
    assert!(last.contains("Impresora no imprime"));
    assert!(last.contains("calificá la atención"));

    // The id prompt came from the engine, the details did not.
    assert_eq!(harness.dialogue.call_count().await, 2);

    let conv = harness.sessions.snapshot(SENDER).await;
    assert_eq!(conv.state, ConvState::AwaitingRating);
    assert_eq!(conv.context.ticket_id, Some(482));

    harness.shutdown().await.unwrap();
}

#[tokio::test]
async fn invalid_rating_reprompts_until_a_valid_score_closes_the_conversation() {
    let harness = TestHarness::builder()
        .with_dialogue_replies(vec![reply(GREETING_MENU), reply(QUERY_ID_PROMPT)])
        .build()
        .await
        .unwrap();
    harness
        .helpdesk
        .add_ticket(make_ticket(482, "Impresora no imprime", "Nueva"))
        .await;

    harness.send(SENDER, "hola").await;
    assert!(harness.wait_for_replies(1).await);
    harness.send(SENDER, "2").await;
    assert!(harness.wait_for_replies(2).await);
    harness.send(SENDER, "482").await;
    assert!(harness.wait_for_replies(3).await);

    // Out-of-range score: reprompt in place, nothing recorded.
    harness.send(SENDER, "5").await;
    assert!(harness.wait_for_replies(4).await);
    let last = harness.last_reply().await.unwrap();
    assert!(last.contains("Opción no válida"));
    assert!(last.contains("calificá la atención"));
    assert!(harness.helpdesk.rating_notes().await.is_empty());

    harness.send(SENDER, "3").await;
    assert!(harness.wait_for_replies(5).await);
    let last = harness.last_reply().await.unwrap();
    assert!(last.starts_with("¡Gracias por tu calificación!"));

    let notes = harness.helpdesk.rating_notes().await;
    assert_eq!(
        notes,
        vec![(482, "📊 Calificación del servicio: Muy Buena 😊".to_string())]
    );
    let counts = harness.storage.counts().await.unwrap();
    assert_eq!(counts.ratings, 1);

    let conv = harness.sessions.snapshot(SENDER).await;
    assert!(conv.finished);

    harness.shutdown().await.unwrap();
}

#[tokio::test]
async fn listing_pages_forward_and_back_with_the_stored_filter() {
    let harness = TestHarness::builder()
        .with_dialogue_replies(vec![reply(GREETING_MENU)])
        .build()
        .await
        .unwrap();
    harness
        .helpdesk
        .add_contact(Contact {
            id: 31,
            name: "Ana García".to_string(),
            office: None,
            phones: vec![SENDER.to_string()],
        })
        .await;

    // Page 1 overfull (more pages exist), page 2 short, then page 1 again.
    let first_page: Vec<Ticket> = (101..=106)
        .map(|id| mine(id, "No enciende", "Nueva"))
        .collect();
    harness
        .helpdesk
        .push_page(IssuePage { issues: first_page.clone(), total_count: 7 })
        .await;
    harness
        .helpdesk
        .push_page(IssuePage {
            issues: vec![mine(107, "Sin red", "Nueva")],
            total_count: 7,
        })
        .await;
    harness
        .helpdesk
        .push_page(IssuePage {
            issues: vec![mine(201, "No enciende", "Nueva")],
            total_count: 7,
        })
        .await;

    harness.send(SENDER, "hola").await;
    assert!(harness.wait_for_replies(1).await);

    // "ver todos" is handled locally; the engine only ever greeted.
    harness.send(SENDER, "4").await;
    assert!(harness.wait_for_replies(2).await);
    let menu = harness.last_reply().await.unwrap();
    assert!(menu.contains("Elija el estado de los tickets"));

    harness.send(SENDER, "1").await;
    assert!(harness.wait_for_replies(3).await);
    let page1 = harness.last_reply().await.unwrap();
    assert!(page1.starts_with("📋 Estos son tus tickets con estado \"Nueva\":"));
    assert!(page1.contains("🎫 Ticket ID: 101"));
    assert!(page1.contains("4️⃣ Siguiente"));

    harness.send(SENDER, "4").await;
    assert!(harness.wait_for_replies(4).await);
    let page2 = harness.last_reply().await.unwrap();
    assert!(page2.contains("🎫 Ticket ID: 107"));
    assert!(!page2.contains("4️⃣ Siguiente"));

    harness.send(SENDER, "5").await;
    assert!(harness.wait_for_replies(5).await);
    let back = harness.last_reply().await.unwrap();
    assert!(back.contains("🎫 Ticket ID: 201"));

    let calls = harness.helpdesk.list_calls().await;
    assert_eq!(
        calls,
        vec![
            (StatusFilter::New, Some(31), 0, 5),
            (StatusFilter::New, Some(31), 5, 5),
            (StatusFilter::New, Some(31), 0, 5),
        ]
    );
    assert_eq!(harness.dialogue.call_count().await, 1);

    harness.shutdown().await.unwrap();
}

#[tokio::test]
async fn confirmation_without_draft_markers_never_reaches_the_backend() {
    let harness = TestHarness::builder()
        .with_dialogue_replies(vec![reply(GREETING_MENU), reply(SUMMARY_WITHOUT_MARKERS)])
        .build()
        .await
        .unwrap();
    harness
        .helpdesk
        .add_technician(Technician { id: 9, name: "Carlos Ruiz".to_string() }, None)
        .await;

    harness.send(SENDER, "hola").await;
    assert!(harness.wait_for_replies(1).await);

    harness.send(SENDER, "la impresora no imprime nada").await;
    assert!(harness.wait_for_replies(2).await);

    harness.send(SENDER, "si").await;
    assert!(harness.wait_for_replies(3).await);

    let last = harness.last_reply().await.unwrap();
    assert!(last.contains("No pude leer los datos del ticket"));
    assert!(harness.helpdesk.created().await.is_empty());

    let conv = harness.sessions.snapshot(SENDER).await;
    assert_eq!(conv.state, ConvState::Greeting);
    assert!(conv.context.greeting_sent, "validation failure keeps the greeting");

    harness.shutdown().await.unwrap();
}

#[tokio::test]
async fn guided_creation_links_the_summary_to_a_real_ticket_and_rating() {
    let harness = TestHarness::builder()
        .with_dialogue_replies(vec![
            reply(GREETING_MENU),
            reply(CATEGORY_MENU),
            reply(PC_PROBLEM_MENU),
            reply(DRAFT_SUMMARY),
        ])
        .build()
        .await
        .unwrap();
    harness
        .helpdesk
        .add_technician(Technician { id: 9, name: "Carlos Ruiz".to_string() }, None)
        .await;

    harness.send(SENDER, "hola").await;
    assert!(harness.wait_for_replies(1).await);
    harness.send(SENDER, "1").await;
    assert!(harness.wait_for_replies(2).await);
    harness.send(SENDER, "2").await;
    assert!(harness.wait_for_replies(3).await);
    harness.send(SENDER, "1").await;
    assert!(harness.wait_for_replies(4).await);

    harness.send(SENDER, "si").await;
    assert!(harness.wait_for_replies(5).await);
    let created_reply = harness.last_reply().await.unwrap();
    assert!(created_reply.starts_with("✅ Ticket creado con éxito"));
    assert!(created_reply.contains("👤 Asignado al técnico: Carlos Ruiz"));

    let created = harness.helpdesk.created().await;
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].subject, "PC: La PC no enciende");
    assert_eq!(created[0].phone_digits, SENDER);
    assert_eq!(created[0].assigned_to, Some(9));

    let conv = harness.sessions.snapshot(SENDER).await;
    assert_eq!(conv.state, ConvState::AwaitingRating);
    assert_eq!(conv.context.ticket_id, Some(1000));

    harness.send(SENDER, "2").await;
    assert!(harness.wait_for_replies(6).await);
    let thanks = harness.last_reply().await.unwrap();
    assert!(thanks.starts_with("¡Gracias por tu calificación!"));

    let notes = harness.helpdesk.rating_notes().await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].0, 1000);
    assert!(notes[0].1.contains("Buena 🙂"));

    let counts = harness.storage.counts().await.unwrap();
    assert_eq!(counts.ratings, 1);

    harness.shutdown().await.unwrap();
}
