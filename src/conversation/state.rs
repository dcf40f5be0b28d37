//! Conversation states

/// Which of the two independent conversation definitions an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    Browse,
    Feedback,
}

/// Course / professor lookup flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrowseState {
    /// Start menu: search by course or by professor
    SelectingAction,
    TypingCourse,
    TypingProf,
    SelectingCourseResults,
    SelectingProfResults,
    /// Professor dossier or the professor's course list (professor path only)
    SelectingCourseForProf,
    SelectingYearSemester,
    ShowingFinalGrades,
}

impl BrowseState {
    #[cfg(test)]
    pub const ALL: [BrowseState; 8] = [
        BrowseState::SelectingAction,
        BrowseState::TypingCourse,
        BrowseState::TypingProf,
        BrowseState::SelectingCourseResults,
        BrowseState::SelectingProfResults,
        BrowseState::SelectingCourseForProf,
        BrowseState::SelectingYearSemester,
        BrowseState::ShowingFinalGrades,
    ];

    /// States that wait for the user to type rather than press a button
    pub fn accepts_text(self) -> bool {
        matches!(self, BrowseState::TypingCourse | BrowseState::TypingProf)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedbackState {
    AskFeedbackType,
    TypingFeedbackMessage,
    ConfirmFeedbackSubmission,
}

impl FeedbackState {
    #[cfg(test)]
    pub const ALL: [FeedbackState; 3] = [
        FeedbackState::AskFeedbackType,
        FeedbackState::TypingFeedbackMessage,
        FeedbackState::ConfirmFeedbackSubmission,
    ];

    pub fn accepts_text(self) -> bool {
        matches!(self, FeedbackState::TypingFeedbackMessage)
    }
}
