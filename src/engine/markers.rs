//! The target-site contract, pinned in one place.
//!
//! Everything the automation knows about the portal's DOM lives here:
//! selectors, URL fragments, bilingual text markers, flagged calendar
//! colors. The portal is template-driven and evolves; when it drifts,
//! this is the file that changes.

/// Path of the pending-entries listing, addressed by a `fecha` query
/// parameter in `DD/MM/YYYY` form.
pub const PENDING_PATH: &str = "/partes/pendientes";

/// URL fragment confirming a per-site validation subpage was reached.
pub const VALIDATION_URL_FRAGMENT: &str = "validar";

/// Host prefixes and path prefixes that belong to the identity provider
/// rather than the authenticated application.
pub const IDENTITY_HOST_MARKERS: &[&str] = &["acceso.", "login.", "sso."];
pub const IDENTITY_PATH_MARKERS: &[&str] = &["/login", "/acceso", "/auth"];

// --- login form ---

pub const USERNAME_SELECTOR: &str = "input#username, input[name='usuario']";
pub const PASSWORD_SELECTOR: &str = "input#password, input[name='clave']";
pub const LOGIN_SUBMIT_SELECTOR: &str = "button[type='submit'], input[type='submit']";
pub const LOGIN_ERROR_SELECTOR: &str = ".login-error, .alert-danger, #msgError";

// --- discovery ---

/// Hidden field carrying every pending date at once, on portal versions
/// that render it: a bracket-delimited, comma-separated ISO list.
pub const PENDING_FIELD_SELECTOR: &str = "input#diasPendientes";
pub const CALENDAR_TRIGGER_SELECTOR: &str =
    "button.ui-datepicker-trigger, img.ui-datepicker-trigger";
pub const CALENDAR_CELL_SELECTOR: &str = "#ui-datepicker-div td[data-handler='selectDay']";

/// Background colors the portal paints on days with pending entries:
/// pure red plus the red-variant tones different templates use.
pub const FLAGGED_COLORS: &[&str] = &[
    "rgb(255, 0, 0)",
    "rgb(204, 0, 0)",
    "rgb(230, 74, 74)",
    "rgb(217, 83, 79)",
];

// --- day listing ---

pub const SITE_ACTION_SELECTOR: &str = "a.btn-validar, input[value='Validar']";

/// Body-text markers meaning "nothing pending on this day". The portal
/// serves both languages depending on the account.
pub const EMPTY_DAY_MARKERS: &[&str] = &[
    "No hay partes pendientes",
    "No existen registros",
    "No records found",
    "No pending entries",
];

// --- validation page, itemized variant ---

pub const WORKER_CHECKBOX_SELECTOR: &str =
    "table.partes input[type='checkbox'][name='trabajador']";
pub const SELECT_ALL_SELECTOR: &str = "input#checkTodos[type='checkbox']";
pub const SUBMIT_SELECTED_SELECTOR: &str = "#btnValidarSeleccionados, button.validar-seleccion";

// --- validation page, batch-report variant ---

pub const REPORT_ACTION_SELECTOR: &str =
    "button.validar-informe, input[value='Validar informe']";

// --- confirmation dialogs ---

pub const DIALOG_BUTTON_SELECTOR: &str = ".ui-dialog:not([style*='display: none']) \
     .ui-dialog-buttonpane button, .modal.in .modal-footer button, \
     .modal.show .modal-footer button";

/// Accept labels across both dialogs; the portal is inconsistent about
/// which it uses where.
pub const DIALOG_ACCEPT_LABELS: &[&str] = &["aceptar", "accept", "ok", "sí", "si", "yes"];

/// Case-insensitive match of a button label against the accept set.
pub fn is_accept_label(label: &str) -> bool {
    let trimmed = label.trim().to_lowercase();
    DIALOG_ACCEPT_LABELS.iter().any(|l| trimmed == *l)
}

/// Whether a rendered body text carries one of the empty-state markers.
pub fn has_empty_day_marker(body: &str) -> bool {
    EMPTY_DAY_MARKERS.iter().any(|m| body.contains(m))
}

/// Whether a computed background color is one of the flagged red tones.
pub fn is_flagged_color(color: &str) -> bool {
    FLAGGED_COLORS.iter().any(|c| color.trim() == *c)
}

/// Collapse runs of whitespace and cap length; for display labels pulled
/// out of the portal's padded table markup.
pub fn collapse_label(text: &str, max_len: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > max_len {
        let truncated: String = collapsed.chars().take(max_len).collect();
        format!("{truncated}...")
    } else {
        collapsed
    }
}
