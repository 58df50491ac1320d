// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Problem menus per category.
//!
//! The entries are wire texts: the chosen problem becomes the intent the
//! remote dialogue engine receives, and the engine echoes it back inside
//! the draft summary. Renumbering or rewording an entry requires the
//! engine's flow definitions to change with it.

use mesabot_core::Category;

const PRINTER: &[&str] = &[
    "No imprime",
    "Imprime borroso",
    "Atasco de papel",
    "Imprime símbolos raros",
    "Ruidos extraños",
    "Otro problema de impresora",
];

const PC: &[&str] = &[
    "PC no enciende",
    "PC lenta",
    "Problema con programas",
    "Se reinicia sola",
    "No reconoce dispositivos",
    "Otro problema pc",
];

const IP_PHONE: &[&str] = &[
    "No tiene tono",
    "No recibe llamadas",
    "No emite llamadas",
    "No tiene red",
    "Interferencia o cortes",
    "Otro problema teléfono ip",
];

const INTERNET: &[&str] = &[
    "No navega",
    "No puedo acceder a sitios web",
    "Internet lento",
    "Internet intermitente",
    "Otro problema de internet",
];

const CONFERENCING: &[&str] = &[
    "No funciona micrófono",
    "No se escucha",
    "Problemas de audio",
    "No se ve video",
    "Pantalla negra",
    "Otro problema audiencia",
];

/// Problem choices for one category, in menu order (digit 1 first).
pub fn problems(category: Category) -> &'static [&'static str] {
    match category {
        Category::Printer => PRINTER,
        Category::Pc => PC,
        Category::IpPhone => IP_PHONE,
        Category::Internet => INTERNET,
        Category::Conferencing => CONFERENCING,
    }
}

/// The digit that returns from a category's problem menu to the category
/// menu (one past the last problem).
pub fn back_digit(category: Category) -> usize {
    problems(category).len() + 1
}
