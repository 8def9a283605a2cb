fn main() {
    aai_survey_lib::run()
}
