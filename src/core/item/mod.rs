pub mod item_model;
pub mod item_repository;
pub mod item_service;
