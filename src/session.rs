use crate::peer::types::SessionDescription;
use crate::utils::random_id;

/// Что клиент успел согласовать: свой offer и применённый answer
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub local_offer: Option<SessionDescription>,
    pub peer_answer: Option<SessionDescription>,
}

impl Session {
    /// Пустая сессия со случайным id
    pub fn new() -> Self {
        Self {
            id: random_id(),
            local_offer: None,
            peer_answer: None,
        }
    }

    /// Offer отправлен, answer ещё не применён
    pub fn offer_pending(&self) -> bool {
        self.local_offer.is_some() && self.peer_answer.is_none()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
