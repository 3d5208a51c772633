pub mod api_connection;
pub mod cli;
pub mod config;
pub mod food_table;
pub mod health_classifier;
pub mod ingredient_analyzer;
pub mod nutrient_normalizer;
pub mod nutrition_scorer;
pub mod recommender;
pub mod report;
