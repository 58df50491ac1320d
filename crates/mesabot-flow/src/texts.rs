// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Every sender-visible reply the flow engine produces.
//!
//! Wording is part of the wire contract: the router's precedence rules and
//! the state reconciler match on fragments of these strings, so changes
//! here must be mirrored there.

use mesabot_core::types::Ticket;

/// Rating menu appended to detail, cancellation and creation replies.
pub(crate) const RATING_PROMPT: &str =
    "📝 Por favor, calificá la atención:\n1️⃣ Mala\n2️⃣ Buena\n3️⃣ Muy Buena\n4️⃣ Excelente";

/// Rating menu variant used when a listing runs out of tickets.
pub(crate) const LISTING_RATING_PROMPT: &str =
    "📝 ¿Cómo calificarías la atención?\n1️⃣ Mala\n2️⃣ Buena\n3️⃣ Muy Buena\n4️⃣ Excelente";

pub(crate) const RATING_THANKS: &str =
    "¡Gracias por tu calificación! 🙏\nTu opinión nos ayuda a mejorar.\nLa conversación ha finalizado.";

pub(crate) const FAREWELL: &str =
    "🤖 Mesabot ha finalizado la conversación. Gracias por comunicarte con nosotros. Saludos.";

/// Status menu. The router recognizes follow-up digits by checking the
/// last bot message for the leading fragment of this text.
pub(crate) const STATUS_MENU: &str =
    "📋 Elija el estado de los tickets que desea ver:\n1️⃣ Nuevo\n2️⃣ En curso\n3️⃣ Salir";

/// Generic apology for backend failures inside a transition.
pub(crate) const FLOW_ERROR: &str = "❌ Ocurrió un error. Por favor, intentá nuevamente.";

pub(crate) const INVALID_TICKET_NUMBER: &str =
    "⚠️ Número de ticket inválido. Por favor, ingresá solo números.";

pub(crate) const INVALID_PAGE_OPTION: &str =
    "Opción no válida. Por favor, elige una opción del menú.\n\nOpciones:\n3️⃣ Salir\n4️⃣ Siguiente\n5️⃣ Anterior";

pub(crate) const INVALID_MENU_OPTION: &str =
    "Opción no válida. Por favor, elige una opción del menú.";

pub(crate) const CONTACT_NOT_FOUND: &str =
    "No se encontró tu contacto en la base de Redmine. No se pueden filtrar tus tickets.";

/// Confirmation arrived but the stored summary lost its draft markers.
pub(crate) const DRAFT_INCOMPLETE: &str =
    "⚠️ No pude leer los datos del ticket. Por favor, generá el ticket nuevamente.";

pub(crate) const EMPTY_PAGE: &str = "No se encontraron tickets en esta página.";

/// Label recorded with a rating, both in the ticket note and locally.
pub(crate) fn rating_label(score: u8) -> &'static str {
    match score {
        1 => "Mala 😞",
        2 => "Buena 🙂",
        3 => "Muy Buena 😊",
        4 => "Excelente 🌟",
        _ => "Sin calificación",
    }
}

pub(crate) fn invalid_rating() -> String {
    format!("⚠️ Opción no válida.\n\n{RATING_PROMPT}")
}

pub(crate) fn query_not_found(id: u64) -> String {
    format!("❌ No se encontró el ticket #{id}.")
}

pub(crate) fn cancel_not_found(id: u64) -> String {
    format!("❌ No se encontró el ticket #{id}")
}

pub(crate) fn already_cancelled(id: u64) -> String {
    format!("⚠️ El ticket #{id} ya está rechazado")
}

pub(crate) fn cancel_confirmed(id: u64) -> String {
    format!("✅ El ticket #{id} ha sido rechazado exitosamente.\n📊 Estado: Rechazado\n{RATING_PROMPT}")
}

/// Detail block for a queried ticket, ending in the rating menu.
pub(crate) fn ticket_details(ticket: &Ticket) -> String {
    let mut out = format!(
        "📋 Detalles del ticket #{id}:\n🆔 ID: {id}\n✏️ Asunto: {subject}\n👤 Asignado al técnico: {assigned}\n⚡ Prioridad: {priority}\n📅 Creado: {created}\n📊 Estado: {status}",
        id = ticket.id,
        subject = ticket.subject,
        assigned = ticket.assigned_to.as_deref().unwrap_or("Sin asignar"),
        priority = ticket.priority.as_deref().unwrap_or("Normal"),
        created = created_label(ticket),
        status = status_label(ticket),
    );
    if let Some(note) = ticket.last_note.as_deref()
        && !note.is_empty()
    {
        out.push_str("\n📝 Última nota: ");
        out.push_str(note);
    }
    out.push_str("\n\n");
    out.push_str(RATING_PROMPT);
    out
}

/// Success block for a freshly created ticket, ending in the rating menu.
pub(crate) fn create_success(ticket: &Ticket) -> String {
    format!(
        "✅ Ticket creado con éxito\n🆔 ID: {id}\n✏️ Asunto: {subject}\n👤 Asignado al técnico: {assigned}\n🕒 Creado: {created}\n\n{RATING_PROMPT}",
        id = ticket.id,
        subject = ticket.subject,
        assigned = ticket.assigned_to.as_deref().unwrap_or("Sin asignar"),
        created = created_label(ticket),
    )
}

pub(crate) fn listing_header(status_name: &str) -> String {
    format!("📋 Estos son tus tickets con estado \"{status_name}\":")
}

/// One listing entry. Ends in a newline so entries joined with `\n`
/// render with a blank line between them.
pub(crate) fn ticket_line(ticket: &Ticket) -> String {
    format!(
        "🎫 Ticket ID: {id}\n✏️ Asunto: {subject}\n👤 Técnico: {assigned}\n📊 {status}\n",
        id = ticket.id,
        subject = ticket.subject,
        assigned = ticket.assigned_to.as_deref().unwrap_or("Sin asignar"),
        status = status_label(ticket),
    )
}

/// Pagination options, built from position: exit always, forward when
/// more pages are offered, back when not on the first page.
pub(crate) fn page_options(page: u32, has_more: bool) -> String {
    let mut options = String::from("\nOpciones:");
    if page == 1 && has_more {
        options.push_str("\n3️⃣ Salir\n4️⃣ Siguiente");
    } else if page > 1 && has_more {
        options.push_str("\n3️⃣ Salir\n4️⃣ Siguiente\n5️⃣ Anterior");
    } else if page > 1 {
        options.push_str("\n3️⃣ Salir\n5️⃣ Anterior");
    } else {
        options.push_str("\n3️⃣ Salir");
    }
    options
}

fn status_label(ticket: &Ticket) -> &str {
    if ticket.status.is_empty() {
        "Desconocido"
    } else {
        &ticket.status
    }
}

fn created_label(ticket: &Ticket) -> String {
    match ticket.created_on.as_deref() {
        Some(raw) => format_date(raw),
        None => "Desconocido".to_string(),
    }
}

/// Render a backend timestamp the way senders expect dates, keeping the
/// raw value when it is not RFC 3339.
pub(crate) fn format_date(raw: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed.format("%d/%m/%Y %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}
