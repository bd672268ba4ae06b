mod test_ice_candidate;
mod test_offer_answer;
mod test_unknown_target;
