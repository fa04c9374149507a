pub mod quote_prefs;
