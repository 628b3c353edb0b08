//! Combat module.
//!
//! Попадания и урон движок не считает: оружие это внешний сервис
//! (`services::Weapon`). `Attack` решает только когда стрелять.

pub mod attack;

pub use attack::Attack;
