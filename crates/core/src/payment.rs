//! Customer-facing payment rejection messages.
//!
//! The payment provider reports a machine-readable `status_detail` with each
//! rejected charge. Only a handful are worth a specific message; anything
//! else gets [`GENERIC_REJECTION`].

/// Message for any rejection without a specific mapping.
pub const GENERIC_REJECTION: &str =
    "Pagamento recusado. Tente novamente com outro cartão ou forma de pagamento.";

/// Map a provider `status_detail` code to a message in Portuguese.
#[must_use]
pub fn rejection_message(status_detail: &str) -> &'static str {
    match status_detail.trim() {
        "cc_rejected_bad_filled_card_number" => "Número do cartão inválido. Confira e tente novamente.",
        "cc_rejected_bad_filled_date" => "Data de validade do cartão inválida.",
        "cc_rejected_bad_filled_security_code" => "Código de segurança (CVV) inválido.",
        "cc_rejected_bad_filled_other" => "Confira os dados do cartão e tente novamente.",
        "cc_rejected_insufficient_amount" => "Saldo ou limite insuficiente no cartão.",
        "cc_rejected_call_for_authorize" => {
            "Pagamento não autorizado. Entre em contato com o emissor do cartão para liberar a compra."
        }
        "cc_rejected_card_disabled" => {
            "Cartão inativo. Entre em contato com o emissor para ativá-lo."
        }
        "cc_rejected_duplicated_payment" => {
            "Pagamento duplicado. Você já realizou um pagamento com esse valor."
        }
        "cc_rejected_max_attempts" => {
            "Limite de tentativas atingido. Use outro cartão ou forma de pagamento."
        }
        "cc_rejected_high_risk" | "cc_rejected_blacklist" => {
            "Pagamento recusado por segurança. Use outro cartão ou forma de pagamento."
        }
        _ => GENERIC_REJECTION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(
            rejection_message("cc_rejected_insufficient_amount"),
            "Saldo ou limite insuficiente no cartão."
        );
        assert_eq!(
            rejection_message(" cc_rejected_bad_filled_security_code "),
            "Código de segurança (CVV) inválido."
        );
    }

    #[test]
    fn test_unknown_code_falls_back() {
        assert_eq!(rejection_message("cc_rejected_other_reason"), GENERIC_REJECTION);
        assert_eq!(rejection_message(""), GENERIC_REJECTION);
    }
}
