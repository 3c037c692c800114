//! User-facing Spanish copy.
//!
//! Screens never show raw backend messages for authentication failures;
//! they go through [`auth_error_message`]. Toasts for save/logout failures
//! show the backend text when there is one, else the fallback here.

use crate::services::{AuthError, AuthErrorKind};

// Sign-in screen
pub const LOGIN_TITLE: &str = "Iniciar Sesión";
pub const LOGIN_SUBTITLE: &str = "Accede a tu panel de administración";
pub const LOGIN_SUBMITTING: &str = "Iniciando sesión...";
pub const REGISTER_TITLE: &str = "Crear Cuenta";
pub const REGISTER_SUBTITLE: &str = "Únete a Tutaviendo y crea tu catálogo";
pub const REGISTER_SUBMITTING: &str = "Creando cuenta...";
pub const HAVE_ACCOUNT: &str = "¿Ya tienes cuenta?";
pub const NO_ACCOUNT: &str = "¿No tienes cuenta?";

// Authentication failures
pub const AUTH_INVALID_CREDENTIALS: &str =
    "Credenciales inválidas. Verifica tu email y contraseña.";
pub const AUTH_EMAIL_NOT_CONFIRMED: &str =
    "Email no confirmado. Por favor revisa tu bandeja de entrada.";
pub const AUTH_ALREADY_REGISTERED: &str =
    "Este email ya está registrado. Intenta iniciar sesión.";
pub const AUTH_GENERIC: &str = "Error de autenticación. Intenta de nuevo.";

// Payments and shipping
pub const SETTINGS_SAVED_TITLE: &str = "¡Configuración guardada!";
pub const SETTINGS_SAVED_MESSAGE: &str =
    "Los cambios de pagos y envíos se han aplicado correctamente";
pub const SETTINGS_SAVE_FAILED_TITLE: &str = "Error al guardar";
pub const SETTINGS_SAVE_FAILED_MESSAGE: &str =
    "No se pudieron guardar los cambios. Intenta de nuevo.";
pub const NO_STORE_TITLE: &str = "No hay tienda configurada";
pub const NO_STORE_MESSAGE: &str = "Primero debes configurar tu tienda";
pub const UNSAVED_CHANGES: &str =
    "Tienes cambios sin guardar. Haz clic en \"Guardar Cambios\" para aplicarlos permanentemente.";
pub const SAVE_CHANGES: &str = "Guardar Cambios";
pub const SAVING: &str = "Guardando...";
pub const NO_CHANGES: &str = "Sin Cambios";
pub const PAYMENT_CASH: &str = "Efectivo";
pub const PAYMENT_BANK_TRANSFER: &str = "Transferencia Bancaria";
pub const SHIPPING_PICKUP: &str = "Recogida en Tienda";
pub const SHIPPING_DELIVERY: &str = "Delivery";
pub const NO_PAYMENT_METHODS: &str = "No hay métodos de pago configurados";
pub const NO_SHIPPING_METHODS: &str = "No hay métodos de entrega configurados";

// User menu
pub const LOGOUT_TITLE: &str = "Sesión cerrada";
pub const LOGOUT_MESSAGE: &str = "Has cerrado sesión correctamente";
pub const LOGOUT_FAILED_TITLE: &str = "Error al cerrar sesión";
pub const LOGOUT_FAILED_MESSAGE: &str = "No se pudo cerrar la sesión. Intenta de nuevo.";
pub const LOGGING_OUT: &str = "Cerrando sesión...";
pub const LOGOUT: &str = "Cerrar Sesión";
pub const FALLBACK_USER_NAME: &str = "Usuario";
pub const FALLBACK_USER_EMAIL: &str = "email@ejemplo.com";
pub const MENU_PROFILE: &str = "Mi Perfil";
pub const MENU_SUBSCRIPTION: &str = "Suscripciones";
pub const MENU_BACK: &str = "← Volver";

/// Product count line of the store card, e.g. "3 productos".
#[must_use]
pub fn product_count(count: usize) -> String {
    format!("{count} productos")
}

/// Localized text for a backend authentication failure.
///
/// Unrecognized failures get the generic message, never the raw backend text.
#[must_use]
pub const fn auth_error_message(error: &AuthError) -> &'static str {
    match error.kind() {
        AuthErrorKind::InvalidCredentials => AUTH_INVALID_CREDENTIALS,
        AuthErrorKind::EmailNotConfirmed => AUTH_EMAIL_NOT_CONFIRMED,
        AuthErrorKind::AlreadyRegistered => AUTH_ALREADY_REGISTERED,
        AuthErrorKind::Unknown => AUTH_GENERIC,
    }
}

/// The backend message if it has any text, else `fallback`.
#[must_use]
pub fn or_fallback<'a>(message: &'a str, fallback: &'a str) -> &'a str {
    if message.trim().is_empty() {
        fallback
    } else {
        message
    }
}
